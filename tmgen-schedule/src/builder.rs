// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Construction of a schedule, one flow at a time.

use crate::flow::{Flow, IncSemantics, Start};
use crate::schedule::{Entry, Schedule};
use crate::trigger::TriggerAllocator;
use crate::types::{NodeId, TriggerId};

/// Emits flow records in order, assigning flow IDs and, on request,
/// completion triggers. This is the only mutable state a pattern strategy
/// touches while it runs.
#[derive(Debug)]
pub struct ScheduleBuilder {
    nodes: usize,
    entries: Vec<Entry>,
    flows: usize,
    allocator: TriggerAllocator,
}

impl ScheduleBuilder {
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            entries: Vec::new(),
            flows: 0,
            allocator: TriggerAllocator::new(),
        }
    }

    /// Append a comment line to the body.
    pub fn comment(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Comment(text.into()));
    }

    /// Append a flow. When `send_done` is set a fresh completion trigger is
    /// allocated, attached to the flow and returned; callers use it to gate
    /// downstream flows.
    pub fn emit(
        &mut self,
        src: NodeId,
        dst: NodeId,
        size_bytes: u64,
        start: Start,
        send_done: bool,
    ) -> Option<TriggerId> {
        self.push(src, dst, size_bytes, start, send_done, None)
    }

    /// [emit](Self::emit) with in-network-compute annotations attached.
    pub fn emit_inc(
        &mut self,
        src: NodeId,
        dst: NodeId,
        size_bytes: u64,
        start: Start,
        send_done: bool,
        semantics: IncSemantics,
    ) -> Option<TriggerId> {
        self.push(src, dst, size_bytes, start, send_done, Some(semantics))
    }

    fn push(
        &mut self,
        src: NodeId,
        dst: NodeId,
        size_bytes: u64,
        start: Start,
        send_done: bool,
        semantics: Option<IncSemantics>,
    ) -> Option<TriggerId> {
        let done = send_done.then(|| self.allocator.next());
        self.flows += 1;
        let id = self.flows as u64;
        self.entries.push(Entry::Flow(Flow {
            id,
            src,
            dst,
            size_bytes,
            start,
            send_done: done,
            semantics,
        }));
        done
    }

    /// Allocate a trigger owned by no flow.
    ///
    /// Used when a degenerate group (a pod with no contributing hosts, for
    /// example) produced no flow but downstream bookkeeping still needs a
    /// valid trigger handle. The ID is declared like any other so the
    /// declaration section stays contiguous.
    pub fn synthetic_trigger(&mut self) -> TriggerId {
        self.allocator.next()
    }

    /// The highest trigger ID issued so far.
    pub fn last_trigger(&self) -> TriggerId {
        self.allocator.last_issued()
    }

    /// Number of flows emitted so far.
    pub fn flow_count(&self) -> usize {
        self.flows
    }

    pub fn finish(self) -> Schedule {
        Schedule::new(self.nodes, self.entries, self.allocator.last_issued())
    }
}
