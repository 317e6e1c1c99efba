// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! `tmgen` - generate connection-matrix schedule files.
//!
//! One subcommand per collective pattern, with positional parameters in
//! the order the downstream tooling expects. A seed of 0 keeps the natural
//! node order; any other seed shuffles deterministically.

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use tmgen_patterns::{IncHierarchical, Pattern, Ring, Supernode, Tree};
use tmgen_schedule::types::ScheduleResult;
use tmgen_schedule::writer::write_file;

const FAILURE_STATUS: i32 = 1;

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Generate connection-matrix schedules for collective workloads")]
struct Cli {
    #[command(subcommand)]
    pattern: PatternArgs,
}

#[derive(Subcommand)]
enum PatternArgs {
    /// Hierarchical multi-ring allreduce
    Ring {
        /// Output connection-matrix file
        output: PathBuf,
        /// Total number of nodes
        nodes: usize,
        /// Number of participating nodes
        conns: usize,
        /// Nodes per ring
        group_size: usize,
        /// Flow size in bytes
        flow_size: u64,
        /// Sort ring members by ID when set to 1
        locality: u8,
        /// Shuffle seed, 0 for no shuffle
        seed: u64,
    },
    /// Tree allreduce (upward reduction, downward broadcast)
    Tree {
        /// Output connection-matrix file
        output: PathBuf,
        /// Total number of nodes
        nodes: usize,
        /// Children per tree node
        branch_factor: usize,
        /// Flow size in bytes
        flow_size: u64,
        /// Shuffle seed, 0 for no shuffle
        seed: u64,
    },
    /// Star allreduce against a single supernode
    Supernode {
        /// Output connection-matrix file
        output: PathBuf,
        /// Total number of nodes, including the supernode
        nodes: usize,
        /// Flow size in bytes
        flow_size: u64,
        /// Number of allreduce rounds
        iterations: usize,
        /// Shuffle seed, 0 for no shuffle
        seed: u64,
    },
    /// In-network-compute allreduce aggregated inside one fat-tree pod
    Inc {
        /// Output connection-matrix file
        output: PathBuf,
        /// Total number of nodes
        nodes: usize,
        /// Fat-tree fan-out factor (pod size is k*k/4)
        k: usize,
        /// Flow size in bytes
        flow_size: u64,
        /// Number of payload chunks
        chunks: usize,
        /// Logical flow ID for the semantics annotations
        fid: u64,
        /// Number of allreduce rounds
        iterations: usize,
        /// Pipelining window in chunks
        window: usize,
        /// Shuffle seed, 0 for no shuffle
        seed: u64,
    },
}

impl PatternArgs {
    fn into_pattern(self) -> (PathBuf, Box<dyn Pattern>) {
        match self {
            PatternArgs::Ring {
                output,
                nodes,
                conns,
                group_size,
                flow_size,
                locality,
                seed,
            } => (
                output,
                Box::new(Ring {
                    nodes,
                    conns,
                    group_size,
                    flow_size,
                    locality: locality == 1,
                    seed,
                }),
            ),
            PatternArgs::Tree {
                output,
                nodes,
                branch_factor,
                flow_size,
                seed,
            } => (
                output,
                Box::new(Tree {
                    nodes,
                    branch_factor,
                    flow_size,
                    seed,
                }),
            ),
            PatternArgs::Supernode {
                output,
                nodes,
                flow_size,
                iterations,
                seed,
            } => (
                output,
                Box::new(Supernode {
                    nodes,
                    flow_size,
                    iterations,
                    seed,
                }),
            ),
            PatternArgs::Inc {
                output,
                nodes,
                k,
                flow_size,
                chunks,
                fid,
                iterations,
                window,
                seed,
            } => (
                output,
                Box::new(IncHierarchical {
                    nodes,
                    k,
                    flow_size,
                    chunks,
                    fid,
                    iterations,
                    window,
                    seed,
                }),
            ),
        }
    }
}

fn run(args: Cli) -> ScheduleResult<()> {
    let (output, pattern) = args.pattern.into_pattern();
    let label = pattern.label();

    let schedule = pattern.generate()?;
    schedule.check()?;
    write_file(&schedule, &output)?;

    log::info!(
        "{label}: wrote {} connections and {} triggers to {}",
        schedule.connection_count(),
        schedule.trigger_count(),
        output.display()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Cli::parse();
    if let Err(error) = run(args) {
        log::error!("{error}");
        exit(FAILURE_STATUS);
    }
}
