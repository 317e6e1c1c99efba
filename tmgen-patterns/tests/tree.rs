// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use tmgen_patterns::{Pattern, Tree};
use tmgen_schedule::flow::Start;
use tmgen_schedule::types::ScheduleError;
use tmgen_schedule::writer::to_string;

#[test]
fn four_nodes_binary_tree() {
    let schedule = Tree {
        nodes: 4,
        branch_factor: 2,
        flow_size: 2000,
        seed: 0,
    }
    .generate()
    .unwrap();
    schedule.check().unwrap();

    assert_eq!(schedule.connection_count(), 6);
    let flows: Vec<_> = schedule.flows().collect();

    // Upward reduction, leaves first, all immediate.
    let upward: Vec<_> = flows[..3]
        .iter()
        .map(|flow| (flow.src, flow.dst, flow.start))
        .collect();
    assert_eq!(
        upward,
        vec![
            (3, 1, Start::Immediate),
            (2, 0, Start::Immediate),
            (1, 0, Start::Immediate),
        ]
    );
    assert!(flows[..3].iter().all(|flow| flow.send_done.is_some()));

    // Downward broadcast, gated on the matching upward triggers.
    let downward: Vec<_> = flows[3..]
        .iter()
        .map(|flow| (flow.src, flow.dst, flow.start))
        .collect();
    assert_eq!(
        downward,
        vec![
            (0, 1, Start::OnTrigger(1)),
            (0, 2, Start::OnTrigger(2)),
            (1, 3, Start::OnTrigger(2)),
        ]
    );

    // The last child of each parent allocates no completion trigger.
    assert!(flows[3].send_done.is_some());
    assert!(flows[4].send_done.is_none());
    assert!(flows[5].send_done.is_none());
}

#[test]
fn trigger_header_matches_declarations() {
    // A fixed 2*(nodes-1) count would over-report whenever a final
    // sibling reuses a trigger; the header must equal the number of
    // declaration lines.
    let schedule = Tree {
        nodes: 4,
        branch_factor: 2,
        flow_size: 2000,
        seed: 0,
    }
    .generate()
    .unwrap();

    let text = to_string(&schedule);
    let declared = text.lines().filter(|l| l.starts_with("trigger id")).count();
    assert_eq!(schedule.trigger_count(), declared as u64);
    assert_eq!(declared, 4);
    assert!(text.lines().any(|l| l == "Triggers 4"));
}

#[test]
fn phase_comments_are_emitted() {
    let schedule = Tree {
        nodes: 2,
        branch_factor: 2,
        flow_size: 100,
        seed: 0,
    }
    .generate()
    .unwrap();
    let text = to_string(&schedule);
    assert!(text.contains("# Phase 1: Upward Reduction"));
    assert!(text.contains("# Phase 2: Downward Broadcast"));
}

#[test]
fn wide_tree_gates_stay_within_upward_triggers() {
    let schedule = Tree {
        nodes: 40,
        branch_factor: 3,
        flow_size: 512,
        seed: 0,
    }
    .generate()
    .unwrap();
    schedule.check().unwrap();

    assert_eq!(schedule.connection_count(), 2 * 39);
    for flow in schedule.flows().skip(39) {
        match flow.start {
            Start::OnTrigger(t) => assert!(t >= 1 && t <= 39),
            Start::Immediate => panic!("downward sends are always gated"),
        }
    }
}

#[test]
fn single_node_tree_is_empty() {
    let schedule = Tree {
        nodes: 1,
        branch_factor: 2,
        flow_size: 100,
        seed: 0,
    }
    .generate()
    .unwrap();
    schedule.check().unwrap();
    assert_eq!(schedule.connection_count(), 0);
    assert_eq!(schedule.trigger_count(), 0);
}

#[test]
fn zero_branch_factor_is_rejected() {
    let err = Tree {
        nodes: 4,
        branch_factor: 0,
        flow_size: 100,
        seed: 0,
    }
    .generate()
    .expect_err("a 0-ary tree has no parents");
    assert!(matches!(err, ScheduleError::Config(_)));
}
