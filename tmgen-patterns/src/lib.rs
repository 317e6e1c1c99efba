// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! `tmgen-patterns` - collective-communication schedule strategies
//!
//! Each pattern compiles a small set of topology parameters into a
//! [Schedule](tmgen_schedule::schedule::Schedule): a DAG of point-to-point
//! flows ordered by oneshot triggers, which the simulator replays. The
//! patterns provided are:
//!
//!  - [ring](crate::ring): hierarchical multi-ring allreduce
//!    (reduce, leader exchange, broadcast)
//!  - [tree](crate::tree): branch-factor-ary tree allreduce
//!    (upward reduction, downward broadcast)
//!  - [supernode](crate::supernode): star allreduce against a single
//!    aggregating node, repeated over iterations
//!  - [inc](crate::inc): in-network-compute allreduce aggregated inside
//!    one fat-tree pod, with chunked payloads and windowed pipelining

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::{NodeId, ScheduleResult};

pub mod inc;
pub mod ring;
pub mod supernode;
pub mod tree;

pub use inc::IncHierarchical;
pub use ring::Ring;
pub use supernode::Supernode;
pub use tree::Tree;

/// A collective-communication algorithm compiled to a flow schedule.
pub trait Pattern {
    /// Short name used in log output and file comments.
    fn label(&self) -> &'static str;

    /// Build the complete in-memory schedule.
    fn generate(&self) -> ScheduleResult<Schedule>;
}

/// The node IDs `0..count`, shuffled when `seed` is nonzero.
///
/// A seed of 0 means "no shuffle"; any other value permutes the IDs
/// deterministically, so two runs with the same parameters produce
/// byte-identical output.
pub(crate) fn node_order(count: usize, seed: u64) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = (0..count).collect();
    if seed != 0 {
        let mut rng = StdRng::seed_from_u64(seed);
        ids.shuffle(&mut rng);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_zero_keeps_natural_order() {
        assert_eq!(node_order(5, 0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn nonzero_seed_is_deterministic() {
        let first = node_order(32, 42);
        let second = node_order(32, 42);
        assert_eq!(first, second);
        assert_ne!(first, node_order(32, 0));
    }
}
