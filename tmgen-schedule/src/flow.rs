// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A single point-to-point transfer and its line format.

use std::fmt;

use crate::types::{FlowId, NodeId, TriggerId};

/// When a flow may begin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Start {
    /// Start at simulated time 0.
    Immediate,
    /// Start once the named trigger has fired.
    OnTrigger(TriggerId),
}

impl Start {
    /// Gate on `trigger` when one is given, otherwise start immediately.
    ///
    /// Strategies carry `Option<TriggerId>` through their phase loops
    /// (there is no previous phase the first time around), so this keeps
    /// the call sites short.
    pub fn gated(trigger: Option<TriggerId>) -> Self {
        match trigger {
            Some(t) => Start::OnTrigger(t),
            None => Start::Immediate,
        }
    }
}

impl fmt::Display for Start {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Start::Immediate => write!(f, "start 0"),
            Start::OnTrigger(t) => write!(f, "trigger {t}"),
        }
    }
}

/// The in-network aggregation operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AggOp {
    #[default]
    Sum,
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AggOp::Sum => write!(f, "SUM"),
        }
    }
}

/// Direction of an aggregated transfer relative to the aggregator node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggDir {
    /// Toward the aggregator.
    Up,
    /// From the aggregator.
    Down,
}

impl fmt::Display for AggDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AggDir::Up => write!(f, "UP"),
            AggDir::Down => write!(f, "DOWN"),
        }
    }
}

/// Annotations interpreted by the simulator's in-network-compute support.
///
/// These do not affect scheduling; they tell the simulator which logical
/// reduction (`fid`), iteration (`rid`) and chunk (`cid`) a transfer
/// belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IncSemantics {
    pub op: AggOp,
    pub dir: AggDir,
    pub fid: u64,
    pub rid: u64,
    pub cid: u64,
}

impl fmt::Display for IncSemantics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "semantics agg_op {} agg_dir {} fid {} rid {} cid {}",
            self.op, self.dir, self.fid, self.rid, self.cid
        )
    }
}

/// One simulated point-to-point transfer.
///
/// A flow without a `send_done` trigger has no downstream dependents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flow {
    pub id: FlowId,
    pub src: NodeId,
    pub dst: NodeId,
    pub size_bytes: u64,
    pub start: Start,
    pub send_done: Option<TriggerId>,
    pub semantics: Option<IncSemantics>,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}->{} id {} {} size {}",
            self.src, self.dst, self.id, self.start, self.size_bytes
        )?;
        if let Some(t) = self.send_done {
            write!(f, " send_done_trigger {t}")?;
        }
        if let Some(sem) = &self.semantics {
            write!(f, " {sem}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_flow_line() {
        let flow = Flow {
            id: 1,
            src: 0,
            dst: 3,
            size_bytes: 1048576,
            start: Start::Immediate,
            send_done: None,
            semantics: None,
        };
        assert_eq!(flow.to_string(), "0->3 id 1 start 0 size 1048576");
    }

    #[test]
    fn gated_flow_with_completion() {
        let flow = Flow {
            id: 7,
            src: 2,
            dst: 5,
            size_bytes: 4096,
            start: Start::OnTrigger(12),
            send_done: Some(13),
            semantics: None,
        };
        assert_eq!(
            flow.to_string(),
            "2->5 id 7 trigger 12 size 4096 send_done_trigger 13"
        );
    }

    #[test]
    fn annotated_flow_line() {
        let flow = Flow {
            id: 3,
            src: 4,
            dst: 0,
            size_bytes: 65536,
            start: Start::OnTrigger(2),
            send_done: Some(9),
            semantics: Some(IncSemantics {
                op: AggOp::Sum,
                dir: AggDir::Up,
                fid: 1,
                rid: 2,
                cid: 5,
            }),
        };
        assert_eq!(
            flow.to_string(),
            "4->0 id 3 trigger 2 size 65536 send_done_trigger 9 \
             semantics agg_op SUM agg_dir UP fid 1 rid 2 cid 5"
        );
    }
}
