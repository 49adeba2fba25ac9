// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{local_hhmm, Clock, FakeClock};
use chrono::TimeDelta;
use yare::parameterized;

fn program(cycles: Vec<ActiveCycle>) -> ActiveProgram {
    ActiveProgram {
        id: ProgramId::from("prog-1"),
        definition_id: "tomatoes".to_string(),
        name: "Tomato feed".to_string(),
        status: ProgramStatus::Running,
        max_execution_time: None,
        cycles,
        skipped_cycles: Vec::new(),
        total_executions: 0,
        activated_at: FakeClock::at_local(2026, 3, 1, 0, 0).now(),
    }
}

#[test]
fn due_cycles_match_start_time() {
    let now = FakeClock::at_local(2026, 3, 1, 8, 0).now();
    let prog = program(vec![
        ActiveCycle::new("morning", "08:00"),
        ActiveCycle::new("evening", "18:00"),
    ]);

    let due = prog.due_cycles(&local_hhmm(now), now);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].cycle_id, CycleId::from("morning"));
}

#[parameterized(
    inactive = { false, false, ProgramStatus::Running },
    executing = { true, true, ProgramStatus::Running },
    paused = { true, false, ProgramStatus::Paused },
    stopped = { true, false, ProgramStatus::Stopped },
)]
fn due_cycles_excludes(is_active: bool, executing: bool, status: ProgramStatus) {
    let now = FakeClock::at_local(2026, 3, 1, 8, 0).now();
    let mut cycle = ActiveCycle::new("morning", "08:00");
    cycle.is_active = is_active;
    cycle.is_currently_executing = executing;
    let mut prog = program(vec![cycle]);
    prog.status = status;

    assert!(prog.due_cycles("08:00", now).is_empty());
}

#[test]
fn skipped_cycle_is_not_due_until_skip_expires() {
    let now = FakeClock::at_local(2026, 3, 1, 8, 0).now();
    let mut prog = program(vec![ActiveCycle::new("morning", "08:00")]);
    prog.skipped_cycles.push(SkippedCycle {
        cycle_id: CycleId::from("morning"),
        skip_until: now + TimeDelta::hours(1),
        reason: Some("reservoir cleaning".to_string()),
    });

    assert!(prog.due_cycles("08:00", now).is_empty());
    let later = now + TimeDelta::hours(2);
    assert_eq!(prog.due_cycles("08:00", later).len(), 1);
}

#[test]
fn cycle_started_this_minute_is_not_due_again() {
    let now = FakeClock::at_local(2026, 3, 1, 8, 0).now();
    let mut cycle = ActiveCycle::new("morning", "08:00");
    cycle.last_executed = Some(now);
    let prog = program(vec![cycle]);

    assert!(prog.due_cycles("08:00", now + TimeDelta::seconds(30)).is_empty());
    let tomorrow = now + TimeDelta::days(1);
    assert_eq!(prog.due_cycles("08:00", tomorrow).len(), 1);
}

#[test]
fn max_execution_falls_back_to_default() {
    let mut prog = program(vec![]);
    assert_eq!(
        prog.max_execution(Duration::from_secs(3600)),
        Duration::from_secs(3600)
    );
    prog.max_execution_time = Some(Duration::from_secs(90 * 60));
    assert_eq!(
        prog.max_execution(Duration::from_secs(3600)),
        Duration::from_secs(5400)
    );
}

#[test]
fn carry_state_keeps_counters_for_surviving_cycles() {
    let mut old = program(vec![ActiveCycle::new("morning", "08:00")]);
    old.total_executions = 7;
    old.status = ProgramStatus::Paused;
    if let Some(c) = old.cycle_mut(&CycleId::from("morning")) {
        c.execution_count = 7;
    }

    let mut fresh = program(vec![
        ActiveCycle::new("morning", "08:30"),
        ActiveCycle::new("night", "22:00"),
    ]);
    fresh.carry_state_from(&old);

    assert_eq!(fresh.total_executions, 7);
    assert_eq!(fresh.status, ProgramStatus::Paused);
    let morning = fresh.cycle(&CycleId::from("morning")).unwrap();
    assert_eq!(morning.start_time, "08:30");
    assert_eq!(morning.execution_count, 7);
    assert_eq!(
        fresh.cycle(&CycleId::from("night")).unwrap().execution_count,
        0
    );
}

#[test]
fn max_execution_time_uses_humantime() {
    let mut prog = program(vec![]);
    prog.max_execution_time = Some(Duration::from_secs(90 * 60));
    let json = serde_json::to_value(&prog).unwrap();
    assert_eq!(json["max_execution_time"], "1h 30m");
}

#[test]
fn cycle_key_display() {
    let key = CycleKey::new("prog-1", "morning");
    assert_eq!(key.to_string(), "prog-1:morning");
}
