// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::Harness;
use sprig_adapters::FakeCatalog;
use sprig_core::{CycleId, ExecutionSession, PausedBy, ProgramId, SessionKind, SessionStatus};
use sprig_storage::{ProgramStore, QueueStore, SessionStore};

fn feed_and_ph() -> FakeCatalog {
    FakeCatalog::new()
        .with_program("tomatoes")
        .with_cycle("tomatoes", "morning", "08:00", &["mix-nutrients"])
        .with_monitor("ph", "read-ph", 5)
}

/// Leave the store as a process killed mid-cycle, with a claimed queue entry, would
fn crash_mid_cycle(h: &Harness) {
    let program = ProgramId::from("tomatoes");
    let cycle = CycleId::from("morning");
    h.store
        .open_session(ExecutionSession::program(
            "crashed",
            "tomatoes",
            "tomatoes program",
            h.now(),
        ))
        .unwrap();
    h.store.cycle_started(&program, &cycle, h.now()).unwrap();
    h.scheduler
        .defer(&h.monitor("ph"), PausedBy::ExecutionActive)
        .unwrap();
    h.store.claim_next_pending().unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn first_tick_reconciles_interrupted_work() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    crash_mid_cycle(&h);
    let h = h.restart(feed_and_ph());
    h.set_time(7, 52);

    h.tick().await;

    let sessions = h.sessions(SessionKind::Program);
    assert_eq!(sessions[0].status, SessionStatus::Failed);
    assert_eq!(sessions[0].error.as_deref(), Some(INTERRUPTED_REASON));
    assert!(!h.program("tomatoes").has_executing_cycle());
    assert_eq!(h.executed(), vec!["read-ph"]);
    assert!(h.queue().is_empty());
    assert!(h.store.active_session().is_none());
}

#[tokio::test(start_paused = true)]
async fn interrupted_cycle_runs_at_its_next_start_time() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    crash_mid_cycle(&h);
    let h = h.restart(feed_and_ph());
    h.set_time(8, 0);

    let report = h.tick().await;
    h.scheduler.wait_idle().await;

    assert_eq!(report.cycles_started.len(), 1);
    assert_eq!(h.cycle_count("tomatoes", "morning"), 2);
    assert_eq!(h.executed(), vec!["read-ph", "mix-nutrients"]);
}

#[tokio::test(start_paused = true)]
async fn recovery_runs_once_per_process() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    h.tick().await;
    h.store
        .open_session(ExecutionSession::program(
            "live",
            "tomatoes",
            "tomatoes program",
            h.now(),
        ))
        .unwrap();

    h.tick().await;

    assert!(h.store.active_session().is_some());
}

#[tokio::test(start_paused = true)]
async fn program_removed_from_catalog_during_a_crash_is_dropped() {
    let h = Harness::at(feed_and_ph(), 7, 50);
    crash_mid_cycle(&h);
    let without_program = || FakeCatalog::new().with_monitor("ph", "read-ph", 5);
    let h = h.restart(without_program());
    assert!(h.store.program(&ProgramId::from("tomatoes")).is_some());
    h.set_time(8, 0);

    let report = h.tick().await;
    h.scheduler.wait_idle().await;

    assert!(h.store.program(&ProgramId::from("tomatoes")).is_none());
    assert!(report.cycles_started.is_empty());
    assert!(!h.executed().contains(&"mix-nutrients".to_string()));
    assert!(h.notify.titles().is_empty());
}
