// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Tree allreduce over a `branch_factor`-ary tree.
//!
//! Node 0 is the root and `parent(i) = (i - 1) / branch_factor`. The upward
//! phase reduces from the leaves toward the root, every send starting
//! immediately and owning a completion trigger. The downward phase
//! broadcasts back out: each send is gated on the trigger that sits
//! `nodes - 1` places behind the allocation counter, which is the trigger
//! the matching upward send produced; all children of a parent but the
//! last allocate a completion trigger of their own, the last child reuses
//! the counter position. The gate arithmetic assumes upward sends of a
//! level complete close together.

use tmgen_schedule::builder::ScheduleBuilder;
use tmgen_schedule::config_error;
use tmgen_schedule::flow::Start;
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::ScheduleResult;

use crate::Pattern;

pub struct Tree {
    /// Total number of simulated hosts.
    pub nodes: usize,
    /// Children per tree node.
    pub branch_factor: usize,
    /// Payload of one transfer in bytes.
    pub flow_size: u64,
    /// Accepted for command-line compatibility; the tree topology is fixed
    /// by node IDs and is never shuffled.
    pub seed: u64,
}

impl Pattern for Tree {
    fn label(&self) -> &'static str {
        "tree"
    }

    fn generate(&self) -> ScheduleResult<Schedule> {
        if self.nodes == 0 {
            config_error!("tree allreduce needs at least one node");
        }
        if self.branch_factor == 0 {
            config_error!("tree branch factor must be at least 1");
        }

        log::info!(
            "tree allreduce: {} nodes, branch factor {}, flow size {} bytes",
            self.nodes,
            self.branch_factor,
            self.flow_size
        );

        let mut builder = ScheduleBuilder::new(self.nodes);
        let upward_sends = (self.nodes - 1) as u64;

        builder.comment("Phase 1: Upward Reduction");
        for node in (1..self.nodes).rev() {
            let parent = (node - 1) / self.branch_factor;
            builder.emit(node, parent, self.flow_size, Start::Immediate, true);
        }

        builder.comment("Phase 2: Downward Broadcast");
        for parent in 0..self.nodes {
            let first_child = self.branch_factor * parent + 1;
            if first_child >= self.nodes {
                // Parents are visited in ascending order, so none of the
                // remaining ones have children either.
                break;
            }
            let last_child = (self.branch_factor * parent + self.branch_factor)
                .min(self.nodes - 1);
            for child in first_child..=last_child {
                let gate = builder.last_trigger() + 1 - upward_sends;
                builder.emit(
                    parent,
                    child,
                    self.flow_size,
                    Start::OnTrigger(gate),
                    child != last_child,
                );
            }
        }

        Ok(builder.finish())
    }
}
