// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! `tmgen-schedule` - connection-matrix schedules for collective workloads
//!
//! This library holds the pieces every traffic-matrix generator shares: a
//! [builder](crate::builder::ScheduleBuilder) that emits flow records and
//! allocates oneshot triggers, the in-memory
//! [schedule](crate::schedule::Schedule) with its structural checks, and
//! the [writer](crate::writer) producing the text format the simulator
//! consumes.
//!
//! A schedule is a DAG: flows either start at simulated time 0 or are gated
//! on a trigger, and a trigger fires exactly once, when the flow naming it
//! as its completion event finishes. The collective patterns themselves
//! live in the `tmgen-patterns` crate.

pub mod builder;
pub mod flow;
pub mod schedule;
pub mod trigger;
pub mod types;
pub mod writer;
