// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The fully built, in-memory schedule.
//!
//! A [Schedule] is produced once by a pattern strategy, checked, then
//! serialized. It is never mutated afterwards; the header counts are
//! derived from its contents so the writer needs a single pass.

use std::collections::HashMap;

use crate::flow::{Flow, Start};
use crate::types::{ScheduleError, ScheduleResult, TriggerId};

/// One line of the schedule body, in emission order.
#[derive(Clone, Debug)]
pub enum Entry {
    /// A `# ...` line, ignored by the reader.
    Comment(String),
    Flow(Flow),
}

/// Node count, ordered body entries and the trigger high-water mark.
#[derive(Debug)]
pub struct Schedule {
    nodes: usize,
    entries: Vec<Entry>,
    triggers_issued: TriggerId,
}

impl Schedule {
    pub(crate) fn new(nodes: usize, entries: Vec<Entry>, triggers_issued: TriggerId) -> Self {
        Self {
            nodes,
            entries,
            triggers_issued,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Body lines (comments and flows) in emission order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The flows alone, in emission order.
    pub fn flows(&self) -> impl Iterator<Item = &Flow> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Flow(flow) => Some(flow),
            Entry::Comment(_) => None,
        })
    }

    /// The value of the `Connections` header line.
    pub fn connection_count(&self) -> usize {
        self.flows().count()
    }

    /// The value of the `Triggers` header line. Declarations cover
    /// `1..=trigger_count()` contiguously.
    pub fn trigger_count(&self) -> TriggerId {
        self.triggers_issued
    }

    /// Verify the structural invariants every generated schedule must hold:
    ///
    /// - flow IDs form the contiguous sequence `1..=connection_count()`;
    /// - every referenced trigger (start gate or completion event) has a
    ///   declaration, i.e. lies in `1..=trigger_count()`;
    /// - no two flows name the same completion trigger (a oneshot fires
    ///   exactly once);
    /// - the relation "flow A's completion trigger gates flow B" is acyclic.
    pub fn check(&self) -> ScheduleResult<()> {
        let flows: Vec<&Flow> = self.flows().collect();

        let mut producer: HashMap<TriggerId, usize> = HashMap::new();
        for (index, flow) in flows.iter().enumerate() {
            if flow.id != index as u64 + 1 {
                return Err(ScheduleError::Invalid(format!(
                    "flow IDs are not sequential: expected {} found {}",
                    index + 1,
                    flow.id
                )));
            }
            if let Start::OnTrigger(t) = flow.start {
                self.check_declared(t, flow)?;
            }
            if let Some(t) = flow.send_done {
                self.check_declared(t, flow)?;
                if let Some(other) = producer.insert(t, index) {
                    return Err(ScheduleError::Invalid(format!(
                        "trigger {t} is the completion event of both flow {} and flow {}",
                        flows[other].id, flow.id
                    )));
                }
            }
        }

        // Walk each flow's chain of gating predecessors. A flow has at most
        // one gate, so any cycle shows up as a revisit of an in-progress
        // node on the current walk.
        #[derive(Copy, Clone, PartialEq)]
        enum Mark {
            New,
            InProgress,
            Done,
        }
        let mut marks = vec![Mark::New; flows.len()];
        for start in 0..flows.len() {
            let mut chain = Vec::new();
            let mut current = start;
            loop {
                match marks[current] {
                    Mark::Done => break,
                    Mark::InProgress => {
                        return Err(ScheduleError::Invalid(format!(
                            "trigger dependencies of flow {} form a cycle",
                            flows[current].id
                        )));
                    }
                    Mark::New => {}
                }
                marks[current] = Mark::InProgress;
                chain.push(current);
                // A gate whose trigger has no producing flow is synthetic;
                // it ends the chain.
                match flows[current].start {
                    Start::OnTrigger(t) => match producer.get(&t) {
                        Some(&prev) => current = prev,
                        None => break,
                    },
                    Start::Immediate => break,
                }
            }
            for visited in chain {
                marks[visited] = Mark::Done;
            }
        }

        Ok(())
    }

    fn check_declared(&self, trigger: TriggerId, flow: &Flow) -> ScheduleResult<()> {
        if trigger == 0 || trigger > self.triggers_issued {
            return Err(ScheduleError::Invalid(format!(
                "flow {} references trigger {trigger} which is never declared",
                flow.id
            )));
        }
        Ok(())
    }
}
