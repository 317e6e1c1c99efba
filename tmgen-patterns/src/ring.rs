// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Hierarchical multi-ring allreduce.
//!
//! The participating nodes are split into `conns / group_size` rings of
//! `group_size` members each. Three phases per ring:
//!
//! 1. Intra-ring reduction: a chain of `group_size - 1` hops, each hop
//!    gated on the previous hop's completion. The final hop's completion
//!    trigger is the ring's reduction-done trigger.
//! 2. Inter-ring leader aggregation: each ring's leader forwards the
//!    reduced aggregate to the next ring's leader (circular), gated on the
//!    ring's reduction-done trigger. The aggregate is a tenth of the base
//!    flow size.
//! 3. Intra-ring broadcast: the result walks the same chain as phase 1,
//!    gated first on the ring's leader-done trigger, then hop on hop.

use itertools::Itertools;
use tmgen_schedule::builder::ScheduleBuilder;
use tmgen_schedule::config_error;
use tmgen_schedule::flow::Start;
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::{NodeId, ScheduleResult};

use crate::{Pattern, node_order};

/// Divisor applied to the base flow size for inter-ring leader flows.
const LEADER_SIZE_DIVISOR: u64 = 10;

pub struct Ring {
    /// Total number of simulated hosts.
    pub nodes: usize,
    /// Number of hosts taking part in the allreduce.
    pub conns: usize,
    /// Hosts per ring. Must divide `conns`.
    pub group_size: usize,
    /// Payload of one reduction hop in bytes.
    pub flow_size: u64,
    /// Sort each ring's members by ID to keep hops local.
    pub locality: bool,
    /// Shuffle seed; 0 keeps the natural node order.
    pub seed: u64,
}

impl Ring {
    /// The per-ring member lists, in ring order.
    ///
    /// The leader stays the first *shuffled* member even when `locality`
    /// re-sorts the chain.
    fn rings(&self, order: &[NodeId]) -> Vec<Vec<NodeId>> {
        order
            .chunks_exact(self.group_size)
            .take(self.conns / self.group_size)
            .map(|chunk| {
                let mut members = chunk.to_vec();
                if self.locality {
                    members.sort_unstable();
                }
                members
            })
            .collect()
    }
}

impl Pattern for Ring {
    fn label(&self) -> &'static str {
        "ring"
    }

    fn generate(&self) -> ScheduleResult<Schedule> {
        if self.group_size == 0 {
            config_error!("ring group size must be at least 1");
        }
        if self.conns % self.group_size != 0 {
            config_error!(
                "group size {} does not divide the connection count {}",
                self.group_size,
                self.conns
            );
        }
        if self.conns > self.nodes {
            config_error!(
                "connection count {} exceeds the node count {}",
                self.conns,
                self.nodes
            );
        }

        let groups = self.conns / self.group_size;
        log::info!(
            "ring allreduce: {} nodes, {} rings of {}, flow size {} bytes, seed {}",
            self.nodes,
            groups,
            self.group_size,
            self.flow_size,
            self.seed
        );

        let order = node_order(self.nodes, self.seed);
        let rings = self.rings(&order);
        let mut builder = ScheduleBuilder::new(self.nodes);

        // Phase 1: intra-ring reduction. A size-1 ring has no chain and no
        // reduction-done trigger; its leader flow starts immediately.
        let mut reduction_done = Vec::with_capacity(groups);
        for members in &rings {
            let mut previous = None;
            for (&src, &dst) in members.iter().tuple_windows() {
                previous = builder.emit(src, dst, self.flow_size, Start::gated(previous), true);
            }
            reduction_done.push(previous);
        }

        // Phase 2: inter-ring leader aggregation. Indexed over rings, so a
        // single ring still emits one (self-directed) leader flow.
        let mut leader_done = Vec::with_capacity(groups);
        for group in 0..groups {
            let leader = order[group * self.group_size];
            let next_leader = order[((group + 1) % groups) * self.group_size];
            let done = builder.emit(
                leader,
                next_leader,
                self.flow_size / LEADER_SIZE_DIVISOR,
                Start::gated(reduction_done[group]),
                true,
            );
            leader_done.push(done);
        }

        // Phase 3: intra-ring broadcast along the phase-1 chain. The final
        // hop has no dependents and takes no completion trigger.
        for (group, members) in rings.iter().enumerate() {
            let hops = members.len() - 1;
            let mut gate = leader_done[group];
            for (index, (&src, &dst)) in members.iter().tuple_windows().enumerate() {
                let done = builder.emit(
                    src,
                    dst,
                    self.flow_size,
                    Start::gated(gate),
                    index + 1 < hops,
                );
                gate = done;
            }
        }

        Ok(builder.finish())
    }
}
