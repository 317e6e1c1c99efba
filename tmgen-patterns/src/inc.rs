// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! In-network-compute allreduce aggregated inside one fat-tree pod.
//!
//! The aggregation pod is pod 0 of a fat tree with fan-out `k`, so its
//! `k²/4` hosts double as aggregators. Payloads are split into chunks and
//! chunk `c` is served by aggregator `agg_nodes[c % agg_nodes.len()]`,
//! spreading the reduction across the pod.
//!
//! Every chunk runs an uplink phase (all other hosts send their share to
//! the chunk's aggregator, annotated `agg_dir UP`) and a downlink phase
//! (the aggregator returns the reduced result, annotated `agg_dir DOWN`,
//! chained host to host). The downlink is gated on the last uplink's
//! completion trigger only, not a true join: the parallel uplinks of a
//! chunk are assumed to finish close together.
//!
//! Pipelining is windowed: the first `window` chunks of an iteration start
//! as soon as the iteration itself is released, and chunk `c >= window`
//! waits for chunk `c - window`'s downlink to complete, so at most
//! `window` chunks are ever in flight. The final chunk's downlink
//! completion releases the next iteration.

use tmgen_schedule::builder::ScheduleBuilder;
use tmgen_schedule::config_error;
use tmgen_schedule::flow::{AggDir, AggOp, IncSemantics, Start};
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::{NodeId, ScheduleResult, TriggerId};

use crate::Pattern;

pub struct IncHierarchical {
    /// Total number of simulated hosts.
    pub nodes: usize,
    /// Fat-tree fan-out factor; the aggregation pod holds `k²/4` hosts.
    pub k: usize,
    /// Payload of one chunk transfer in bytes.
    pub flow_size: u64,
    /// Number of chunks the payload is split into.
    pub chunks: usize,
    /// Logical flow identifier carried in the semantics annotations.
    pub fid: u64,
    /// Number of allreduce rounds.
    pub iterations: usize,
    /// Maximum number of chunks of one iteration in flight concurrently.
    pub window: usize,
    /// Accepted for command-line compatibility; host order is fixed by ID.
    pub seed: u64,
}

impl IncHierarchical {
    fn pod_size(&self) -> usize {
        self.k * self.k / 4
    }

    fn chunk_aggregator(&self, chunk: usize) -> NodeId {
        // Aggregators are the hosts of pod 0, i.e. IDs 0..pod_size.
        chunk % self.pod_size()
    }

    fn semantics(&self, dir: AggDir, rid: u64, cid: u64) -> IncSemantics {
        IncSemantics {
            op: AggOp::Sum,
            dir,
            fid: self.fid,
            rid,
            cid,
        }
    }
}

impl Pattern for IncHierarchical {
    fn label(&self) -> &'static str {
        "inc"
    }

    fn generate(&self) -> ScheduleResult<Schedule> {
        if self.nodes == 0 {
            config_error!("INC allreduce needs at least one node");
        }
        if self.k < 2 {
            config_error!("fat-tree fan-out {} leaves an empty aggregation pod", self.k);
        }
        if self.pod_size() > self.nodes {
            config_error!(
                "aggregation pod of {} hosts exceeds the node count {}",
                self.pod_size(),
                self.nodes
            );
        }
        if self.chunks == 0 {
            config_error!("INC allreduce needs at least one chunk");
        }
        if self.window == 0 {
            config_error!("pipelining window must be at least 1");
        }
        if self.iterations == 0 {
            config_error!("INC allreduce needs at least one iteration");
        }

        log::info!(
            "INC allreduce: {} nodes, aggregation pod of {} (k = {}), {} chunks, \
             window {}, {} iterations, fid {}",
            self.nodes,
            self.pod_size(),
            self.k,
            self.chunks,
            self.window,
            self.iterations,
            self.fid
        );

        let mut builder = ScheduleBuilder::new(self.nodes);

        // Completion trigger of each chunk's final downlink, refreshed every
        // iteration; entry `c - window` is the admission gate for chunk `c`.
        let mut downlink_done: Vec<Option<TriggerId>> = vec![None; self.chunks];
        let mut iteration_start: Option<TriggerId> = None;

        for iteration in 0..self.iterations {
            let rid = iteration as u64 + 1;
            builder.comment(format!("--- ITERATION {rid} ---"));

            for chunk in 0..self.chunks {
                let admission = if chunk < self.window {
                    iteration_start
                } else {
                    downlink_done[chunk - self.window].or(iteration_start)
                };
                let aggregator = self.chunk_aggregator(chunk);
                let cid = chunk as u64;

                // Uplink: every other host contributes its share.
                let mut last_uplink = None;
                for src in 0..self.nodes {
                    if src == aggregator {
                        continue;
                    }
                    last_uplink = builder.emit_inc(
                        src,
                        aggregator,
                        self.flow_size,
                        Start::gated(admission),
                        true,
                        self.semantics(AggDir::Up, rid, cid),
                    );
                }
                // A pod with no contributing hosts still reserves a trigger
                // so the downlink bookkeeping has a valid handle.
                let uplinks_done = match last_uplink {
                    Some(trigger) => trigger,
                    None => builder.synthetic_trigger(),
                };

                // Downlink: the reduced result fans back out, chained so
                // each send releases the next.
                let mut last_downlink = None;
                let mut gate = uplinks_done;
                for dst in 0..self.nodes {
                    if dst == aggregator {
                        continue;
                    }
                    if let Some(trigger) = builder.emit_inc(
                        aggregator,
                        dst,
                        self.flow_size,
                        Start::OnTrigger(gate),
                        true,
                        self.semantics(AggDir::Down, rid, cid),
                    ) {
                        last_downlink = Some(trigger);
                        gate = trigger;
                    }
                }
                downlink_done[chunk] = match last_downlink {
                    Some(trigger) => Some(trigger),
                    None => Some(builder.synthetic_trigger()),
                };
            }

            iteration_start = downlink_done[self.chunks - 1];
        }

        Ok(builder.finish())
    }
}
