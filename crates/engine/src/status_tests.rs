// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Harness;
use sprig_adapters::{FakeCatalog, Scripted};
use sprig_core::{CycleKey, PausedBy};
use std::time::Duration;

fn feed_and_ph() -> FakeCatalog {
    FakeCatalog::new()
        .with_program("tomatoes")
        .with_cycle("tomatoes", "morning", "08:00", &["mix-nutrients"])
        .with_max_execution("tomatoes", Duration::from_secs(1800))
        .with_monitor("ph", "read-ph", 5)
}

#[tokio::test(start_paused = true)]
async fn live_status_shows_running_cycle_and_queue() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.interpreter
        .script("mix-nutrients", Scripted::RunFor(Duration::from_secs(600)));
    h.set_time(8, 0);

    h.tick().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    let status = h.scheduler.status();

    assert!(status.hardware_busy);
    assert_eq!(status.running_cycles.len(), 1);
    let running = &status.running_cycles[0];
    assert_eq!(
        CycleKey::new(running.program_id.clone(), running.cycle_id.clone()),
        CycleKey::new("tomatoes", "morning")
    );
    assert_eq!(
        running.max_end,
        Some(h.now() + chrono::TimeDelta::minutes(30))
    );
    assert_eq!(status.queue.pending, 1);
    assert_eq!(status.queue.entries[0].paused_by, PausedBy::ExecutionActive);
    assert!(status.active_session.is_some());

    h.scheduler.wait_idle().await;
    let status = h.scheduler.status();
    assert!(!status.hardware_busy);
    assert!(status.running_cycles.is_empty());
    assert_eq!(status.queue.pending, 0);
    assert_eq!(status.daily.completed_cycles.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stored_status_uses_executing_flags() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.interpreter
        .script("mix-nutrients", Scripted::RunFor(Duration::from_secs(600)));
    h.set_time(8, 0);

    h.tick().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    let status = StatusReport::from_store(h.store.as_ref(), h.now());

    assert_eq!(status.running_cycles.len(), 1);
    assert_eq!(status.running_cycles[0].started_at, Some(h.now()));
    assert!(status.running_monitors.is_empty());

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["queue"]["pending"], 1);
    assert_eq!(json["programs"][0]["id"], "tomatoes");

    h.scheduler.wait_idle().await;
}
