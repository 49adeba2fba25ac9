// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Harness;
use sprig_adapters::FakeCatalog;

fn end(flow_id: &str, success: bool) -> ExecutionNotice {
    ExecutionNotice::EndBlockExecuted {
        flow_id: flow_id.to_string(),
        success,
    }
}

#[tokio::test]
async fn settles_after_end_and_idle() {
    let (tx, rx) = broadcast::channel(16);
    tx.send(ExecutionNotice::StatusChanged { idle: true }).unwrap();
    tx.send(end("mix", true)).unwrap();

    assert_eq!(settle(rx, "mix").await, Settled::Settled);
}

#[tokio::test]
async fn flow_completed_counts_as_end() {
    let (tx, rx) = broadcast::channel(16);
    tx.send(ExecutionNotice::FlowCompleted {
        flow_id: "mix".to_string(),
    })
    .unwrap();
    tx.send(ExecutionNotice::StatusChanged { idle: true }).unwrap();

    assert_eq!(settle(rx, "mix").await, Settled::Settled);
}

#[tokio::test]
async fn other_flows_and_failed_ends_are_ignored() {
    let (tx, rx) = broadcast::channel(16);
    tx.send(end("read-ph", true)).unwrap();
    tx.send(end("mix", false)).unwrap();
    tx.send(ExecutionNotice::StatusChanged { idle: true }).unwrap();
    drop(tx);

    assert_eq!(settle(rx, "mix").await, Settled::ChannelClosed);
}

#[tokio::test]
async fn lagging_receiver_keeps_waiting() {
    let (tx, rx) = broadcast::channel(2);
    for _ in 0..4 {
        tx.send(ExecutionNotice::StatusChanged { idle: false }).unwrap();
    }
    tx.send(end("mix", true)).unwrap();
    tx.send(ExecutionNotice::StatusChanged { idle: true }).unwrap();

    assert_eq!(settle(rx, "mix").await, Settled::Settled);
}

#[tokio::test(start_paused = true)]
async fn wait_gives_up_after_the_settle_timeout() {
    let h = Harness::at(FakeCatalog::new(), 8, 0);
    let (_tx, rx) = broadcast::channel::<ExecutionNotice>(4);

    let started = tokio::time::Instant::now();
    let outcome = h.scheduler.wait_settled(rx, "mix").await;

    assert_eq!(outcome, Settled::TimedOut);
    assert!(started.elapsed() >= h.scheduler.config().settle_timeout);
}
