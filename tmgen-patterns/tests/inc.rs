// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use tmgen_patterns::{IncHierarchical, Pattern};
use tmgen_schedule::flow::{AggDir, Flow, Start};
use tmgen_schedule::schedule::Schedule;
use tmgen_schedule::types::ScheduleError;
use tmgen_schedule::writer::to_string;

fn small() -> IncHierarchical {
    IncHierarchical {
        nodes: 4,
        k: 2,
        flow_size: 65536,
        chunks: 3,
        fid: 1,
        iterations: 2,
        window: 2,
        seed: 0,
    }
}

fn chunk_flows(schedule: &Schedule, rid: u64, cid: u64, dir: AggDir) -> Vec<&Flow> {
    schedule
        .flows()
        .filter(|flow| {
            flow.semantics
                .as_ref()
                .is_some_and(|sem| sem.rid == rid && sem.cid == cid && sem.dir == dir)
        })
        .collect()
}

#[test]
fn every_flow_carries_semantics() {
    let schedule = small().generate().unwrap();
    schedule.check().unwrap();

    // k = 2 gives a pod of one aggregator (node 0); 3 hosts contribute.
    // Per chunk: 3 uplinks + 3 downlinks, over 3 chunks and 2 iterations.
    assert_eq!(schedule.connection_count(), 36);
    for flow in schedule.flows() {
        let sem = flow.semantics.as_ref().expect("INC flows are annotated");
        assert_eq!(sem.fid, 1);
        assert!(sem.rid >= 1 && sem.rid <= 2);
        assert!(sem.cid < 3);
        match sem.dir {
            AggDir::Up => assert_eq!(flow.dst, 0),
            AggDir::Down => assert_eq!(flow.src, 0),
        }
    }
}

#[test]
fn downlink_waits_for_last_uplink_then_chains() {
    let schedule = small().generate().unwrap();

    let uplinks = chunk_flows(&schedule, 1, 0, AggDir::Up);
    let downlinks = chunk_flows(&schedule, 1, 0, AggDir::Down);
    assert_eq!(uplinks.len(), 3);
    assert_eq!(downlinks.len(), 3);

    let last_uplink = uplinks.last().unwrap().send_done.unwrap();
    assert_eq!(downlinks[0].start, Start::OnTrigger(last_uplink));
    for pair in downlinks.windows(2) {
        assert_eq!(pair[1].start, Start::OnTrigger(pair[0].send_done.unwrap()));
    }
}

#[test]
fn window_admits_only_so_many_chunks() {
    let schedule = small().generate().unwrap();

    // window = 2: chunks 0 and 1 of iteration 1 start at time 0, chunk 2
    // waits for chunk 0's final downlink.
    for cid in 0..2 {
        for flow in chunk_flows(&schedule, 1, cid, AggDir::Up) {
            assert_eq!(flow.start, Start::Immediate);
        }
    }
    let chunk0_done = chunk_flows(&schedule, 1, 0, AggDir::Down)
        .last()
        .unwrap()
        .send_done
        .unwrap();
    for flow in chunk_flows(&schedule, 1, 2, AggDir::Up) {
        assert_eq!(flow.start, Start::OnTrigger(chunk0_done));
    }
}

#[test]
fn iterations_chain_through_the_final_chunk() {
    let schedule = small().generate().unwrap();

    let final_downlink = chunk_flows(&schedule, 1, 2, AggDir::Down)
        .last()
        .unwrap()
        .send_done
        .unwrap();
    for cid in 0..2 {
        for flow in chunk_flows(&schedule, 2, cid, AggDir::Up) {
            assert_eq!(flow.start, Start::OnTrigger(final_downlink));
        }
    }
}

#[test]
fn chunks_rotate_over_the_aggregation_pod() {
    let schedule = IncHierarchical {
        nodes: 16,
        k: 4,
        flow_size: 1024,
        chunks: 6,
        fid: 3,
        iterations: 1,
        window: 6,
        seed: 0,
    }
    .generate()
    .unwrap();
    schedule.check().unwrap();

    // Pod size k²/4 = 4: chunk c lands on aggregator c % 4.
    for cid in 0..6 {
        let uplinks = chunk_flows(&schedule, 1, cid as u64, AggDir::Up);
        assert_eq!(uplinks.len(), 15);
        assert!(uplinks.iter().all(|flow| flow.dst == cid % 4));
    }
}

#[test]
fn degenerate_pod_reserves_synthetic_triggers() {
    let schedule = IncHierarchical {
        nodes: 1,
        k: 2,
        flow_size: 1024,
        chunks: 2,
        fid: 1,
        iterations: 1,
        window: 1,
        seed: 0,
    }
    .generate()
    .unwrap();
    schedule.check().unwrap();

    // The lone host is its own aggregator: no flows, but the uplink and
    // downlink handles of each chunk are still allocated and declared.
    assert_eq!(schedule.connection_count(), 0);
    assert_eq!(schedule.trigger_count(), 4);
}

#[test]
fn comment_marks_each_iteration() {
    let text = to_string(&small().generate().unwrap());
    assert!(text.contains("# --- ITERATION 1 ---"));
    assert!(text.contains("# --- ITERATION 2 ---"));
}

#[test]
fn generation_is_deterministic() {
    let first = to_string(&small().generate().unwrap());
    let second = to_string(&small().generate().unwrap());
    assert_eq!(first, second);
}

#[test]
fn degenerate_parameters_are_rejected() {
    let no_pod = IncHierarchical { k: 1, ..small() };
    assert!(matches!(
        no_pod.generate(),
        Err(ScheduleError::Config(_))
    ));

    let no_chunks = IncHierarchical { chunks: 0, ..small() };
    assert!(matches!(
        no_chunks.generate(),
        Err(ScheduleError::Config(_))
    ));

    let no_window = IncHierarchical { window: 0, ..small() };
    assert!(matches!(
        no_window.generate(),
        Err(ScheduleError::Config(_))
    ));

    let pod_too_big = IncHierarchical { nodes: 2, k: 4, ..small() };
    assert!(matches!(
        pod_too_big.generate(),
        Err(ScheduleError::Config(_))
    ));
}
