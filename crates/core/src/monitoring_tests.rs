// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use yare::parameterized;

fn base() -> DateTime<Utc> {
    FakeClock::at_local(2026, 3, 1, 8, 0).now()
}

#[test]
fn new_flow_is_due_one_interval_later() {
    let flow = MonitoringFlow::new("ph", "read-ph", "pH check", 5, base());
    assert!(!flow.is_due(base()));
    assert!(!flow.is_due(base() + TimeDelta::minutes(4)));
    assert!(flow.is_due(base() + TimeDelta::minutes(5)));
}

#[parameterized(
    zero = { 0, 1 },
    one = { 1, 1 },
    day = { 1440, 1440 },
    over = { 5000, 1440 },
)]
fn interval_is_clamped(requested: u32, expected: u32) {
    let flow = MonitoringFlow::new("ph", "read-ph", "pH check", requested, base());
    assert_eq!(flow.interval_minutes, expected);
}

#[test]
fn inactive_flow_is_never_due() {
    let mut flow = MonitoringFlow::new("ph", "read-ph", "pH check", 5, base());
    flow.is_active = false;
    flow.next_execution = None;
    assert!(!flow.is_due(base()));
}

#[test]
fn flow_without_next_execution_is_due() {
    let mut flow = MonitoringFlow::new("ph", "read-ph", "pH check", 5, base());
    flow.next_execution = None;
    assert!(flow.is_due(base()));
}

#[test]
fn record_execution_updates_statistics() {
    let mut flow = MonitoringFlow::new("ph", "read-ph", "pH check", 5, base());
    let ran_at = base() + TimeDelta::minutes(5);

    flow.record_execution(ran_at, Some("probe offline".to_string()));
    assert_eq!(flow.execution_count, 1);
    assert_eq!(flow.last_executed, Some(ran_at));
    assert_eq!(flow.next_execution, Some(ran_at + TimeDelta::minutes(5)));
    assert_eq!(flow.last_error.as_deref(), Some("probe offline"));

    flow.record_execution(ran_at + TimeDelta::minutes(5), None);
    assert_eq!(flow.execution_count, 2);
    assert_eq!(flow.last_error, None);
}

#[test]
fn carry_state_reschedules_on_interval_change() {
    let mut old = MonitoringFlow::new("ph", "read-ph", "pH check", 5, base());
    old.record_execution(base(), None);

    let mut fresh = MonitoringFlow::new("ph", "read-ph", "pH check", 15, base());
    fresh.carry_state_from(&old);

    assert_eq!(fresh.execution_count, 1);
    assert_eq!(fresh.next_execution, Some(base() + TimeDelta::minutes(15)));
}
