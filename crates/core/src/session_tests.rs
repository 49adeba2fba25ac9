// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use chrono::TimeDelta;

fn at(minutes: i64) -> DateTime<Utc> {
    FakeClock::at_local(2026, 3, 1, 8, 0).now() + TimeDelta::minutes(minutes)
}

fn cycle(id: &str) -> CycleId {
    CycleId::from(id)
}

#[test]
fn program_session_completes_when_all_cycles_terminal() {
    let mut session = ExecutionSession::program("sess-1", "prog-1", "Tomato feed", at(0));
    session.start_cycle(cycle("morning"), at(0));
    session.start_cycle(cycle("rinse"), at(0));

    session.finish_cycle(&cycle("morning"), RunStatus::Completed, at(5));
    assert_eq!(session.status, SessionStatus::Running);

    session.finish_cycle(&cycle("rinse"), RunStatus::Failed, at(6));
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.ended_at, Some(at(6)));
}

#[test]
fn starting_a_running_cycle_twice_keeps_one_record() {
    let mut session = ExecutionSession::program("sess-1", "prog-1", "Tomato feed", at(0));
    session.start_cycle(cycle("morning"), at(0));
    session.start_cycle(cycle("morning"), at(1));
    assert_eq!(session.cycles.len(), 1);
}

#[test]
fn flow_runs_are_recorded_under_their_cycle() {
    let mut session = ExecutionSession::program("sess-1", "prog-1", "Tomato feed", at(0));
    session.start_cycle(cycle("morning"), at(0));
    session.start_flow(&cycle("morning"), "mix", "Mix nutrients", at(0));
    session.finish_flow(&cycle("morning"), "mix", RunStatus::Completed, None, at(2));
    session.start_flow(&cycle("morning"), "pump", "Pump", at(2));
    session.finish_flow(
        &cycle("morning"),
        "pump",
        RunStatus::Failed,
        Some("pump stalled".to_string()),
        at(3),
    );

    let run = session.cycle_run(&cycle("morning")).unwrap();
    assert_eq!(run.flows.len(), 2);
    assert_eq!(run.flows[0].status, RunStatus::Completed);
    assert_eq!(run.flows[1].error.as_deref(), Some("pump stalled"));
}

#[test]
fn fail_closes_running_cycles_and_flows() {
    let mut session = ExecutionSession::monitoring("sess-2", "ph", "pH check", at(0));
    assert_eq!(session.status, SessionStatus::Starting);
    session.mark_running();
    session.start_cycle(cycle("monitoring"), at(0));
    session.start_flow(&cycle("monitoring"), "read-ph", "Read pH", at(0));

    session.fail("interrupted by restart", at(1));

    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error.as_deref(), Some("interrupted by restart"));
    let run = &session.cycles[0];
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.flows[0].status, RunStatus::Failed);
}

#[test]
fn terminal_sessions_ignore_further_transitions() {
    let mut session = ExecutionSession::program("sess-1", "prog-1", "Tomato feed", at(0));
    session.complete(at(1));
    session.fail("late", at(2));

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.error, None);
    assert_eq!(session.ended_at, Some(at(1)));
}

#[test]
fn session_without_cycles_does_not_auto_complete() {
    let mut session = ExecutionSession::program("sess-1", "prog-1", "Tomato feed", at(0));
    session.finish_cycle(&cycle("unknown"), RunStatus::Completed, at(1));
    assert!(session.is_active());
}
