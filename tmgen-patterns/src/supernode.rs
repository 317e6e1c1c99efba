// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Star allreduce against a single aggregating supernode.
//!
//! The supernode is the highest node ID. Every iteration has two phases:
//! all regular nodes send their gradients to the supernode, then the
//! supernode returns the aggregate to each regular node in sequence. The
//! fan-out is gated on the *last* fan-in completion trigger only, not a
//! true join: the parallel fan-in sends are assumed to finish
//! near-simultaneously. The final
//! fan-out send of a non-final iteration produces the trigger that releases
//! the next iteration's fan-in.

use tmgen_schedule::builder::ScheduleBuilder;
use tmgen_schedule::config_error;
use tmgen_schedule::flow::Start;
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::ScheduleResult;

use crate::{Pattern, node_order};

pub struct Supernode {
    /// Total number of simulated hosts, including the supernode.
    pub nodes: usize,
    /// Payload of one gradient transfer in bytes.
    pub flow_size: u64,
    /// Number of allreduce rounds.
    pub iterations: usize,
    /// Shuffle seed for the regular-node order; 0 keeps the natural order.
    pub seed: u64,
}

impl Pattern for Supernode {
    fn label(&self) -> &'static str {
        "supernode"
    }

    fn generate(&self) -> ScheduleResult<Schedule> {
        if self.nodes < 2 {
            config_error!("supernode allreduce needs at least one regular node");
        }
        if self.iterations == 0 {
            config_error!("supernode allreduce needs at least one iteration");
        }

        let supernode = self.nodes - 1;
        let regular = node_order(supernode, self.seed);
        log::info!(
            "supernode allreduce: {} regular nodes -> node {}, {} iterations, \
             flow size {} bytes, seed {}",
            regular.len(),
            supernode,
            self.iterations,
            self.flow_size,
            self.seed
        );

        let mut builder = ScheduleBuilder::new(self.nodes);
        let mut next_iteration = None;

        for iteration in 0..self.iterations {
            let final_iteration = iteration + 1 == self.iterations;

            // Phase 1: parallel fan-in. Iteration 0 starts at time 0, later
            // iterations wait for the previous broadcast to finish.
            let mut last_fan_in = None;
            for &node in &regular {
                last_fan_in = builder.emit(
                    node,
                    supernode,
                    self.flow_size,
                    Start::gated(next_iteration),
                    true,
                );
            }

            // Phase 2: sequential fan-out, gated on the last fan-in trigger
            // and then chained send on send.
            let mut gate = last_fan_in;
            for (index, &node) in regular.iter().enumerate() {
                let final_send = index + 1 == regular.len();
                gate = builder.emit(
                    supernode,
                    node,
                    self.flow_size,
                    Start::gated(gate),
                    !(final_send && final_iteration),
                );
            }
            next_iteration = gate;
        }

        Ok(builder.finish())
    }
}
