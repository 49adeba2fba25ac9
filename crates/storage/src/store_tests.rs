// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use tempfile::TempDir;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
}

fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("sprig.wal")).unwrap();
    (dir, store)
}

fn flow(id: &str) -> MonitoringFlow {
    MonitoringFlow::new(id, format!("read-{id}"), format!("{id} check"), 5, at(7, 0))
}

const HOUR: Duration = Duration::from_secs(3600);

#[test]
fn only_one_session_can_be_active() {
    let (_dir, store) = open_store();

    let first = store
        .open_session(ExecutionSession::monitoring("s-1", "ph", "pH", at(8, 0)))
        .unwrap();
    assert_eq!(first, Admission::Opened(SessionId::from("s-1")));

    let second = store
        .open_session(ExecutionSession::program("s-2", "tomatoes", "Tomato feed", at(8, 0)))
        .unwrap();
    match second {
        Admission::Busy(active) => assert_eq!(active.id, SessionId::from("s-1")),
        other => panic!("expected Busy, got {other:?}"),
    }
    assert!(store.session(&SessionId::from("s-2")).is_none());
}

#[test]
fn program_session_joins_active_session_of_same_program() {
    let (_dir, store) = open_store();
    store
        .open_session(ExecutionSession::program("s-1", "tomatoes", "Tomato feed", at(8, 0)))
        .unwrap();

    let again = store
        .open_session(ExecutionSession::program("s-2", "tomatoes", "Tomato feed", at(8, 1)))
        .unwrap();
    assert_eq!(again, Admission::Joined(SessionId::from("s-1")));
}

#[test]
fn session_is_free_again_after_completion() {
    let (_dir, store) = open_store();
    let id = SessionId::from("s-1");
    store
        .open_session(ExecutionSession::monitoring("s-1", "ph", "pH", at(8, 0)))
        .unwrap();
    store.complete_session(&id, at(8, 1)).unwrap();

    assert!(store.active_session().is_none());
    let next = store
        .open_session(ExecutionSession::monitoring("s-2", "ph", "pH", at(8, 2)))
        .unwrap();
    assert_eq!(next, Admission::Opened(SessionId::from("s-2")));
}

#[test]
fn defer_keeps_one_open_entry_per_flow() {
    let (_dir, store) = open_store();
    let ph = flow("ph");

    let first = store
        .defer(&ph, PausedBy::ExecutionActive, EntryId::from("q-1"), at(8, 0), HOUR)
        .unwrap();
    let second = store
        .defer(&ph, PausedBy::TimeoutInterrupt, EntryId::from("q-2"), at(8, 1), HOUR)
        .unwrap();

    assert_eq!(first, Deferral::Queued(EntryId::from("q-1")));
    assert_eq!(second, Deferral::Retagged(EntryId::from("q-1")));
    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].paused_by, PausedBy::TimeoutInterrupt);
    assert_eq!(entries[0].added_at, at(8, 0));
}

#[test]
fn defer_prunes_stale_terminal_entries_first() {
    let (_dir, store) = open_store();
    let ph = flow("ph");
    store
        .defer(&ph, PausedBy::ExecutionActive, EntryId::from("q-1"), at(6, 0), HOUR)
        .unwrap();
    store.fail_entry(&EntryId::from("q-1"), "probe offline").unwrap();

    store
        .defer(&ph, PausedBy::ExecutionActive, EntryId::from("q-2"), at(8, 0), HOUR)
        .unwrap();

    let ids: Vec<_> = store.entries().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![EntryId::from("q-2")]);
}

#[test]
fn claim_takes_oldest_pending_and_marks_executing() {
    let (_dir, store) = open_store();
    store
        .defer(&flow("ec"), PausedBy::ExecutionActive, EntryId::from("q-2"), at(8, 5), HOUR)
        .unwrap();
    store
        .defer(&flow("ph"), PausedBy::ExecutionActive, EntryId::from("q-1"), at(8, 0), HOUR)
        .unwrap();

    let claimed = store.claim_next_pending().unwrap().unwrap();
    assert_eq!(claimed.id, EntryId::from("q-1"));
    assert_eq!(claimed.status, EntryStatus::Executing);
    assert_eq!(claimed.execution_attempts, 1);

    let next = store.claim_next_pending().unwrap().unwrap();
    assert_eq!(next.id, EntryId::from("q-2"));
    assert!(store.claim_next_pending().unwrap().is_none());
    assert!(!store.has_pending());
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprig.wal");
    {
        let store = Store::open(&path).unwrap();
        store.upsert_monitor(flow("ph")).unwrap();
        store
            .record_monitor_execution(&MonitorId::from("ph"), at(8, 0), None)
            .unwrap();
        store
            .open_session(ExecutionSession::monitoring("s-1", "ph", "pH", at(8, 0)))
            .unwrap();
    }

    let store = Store::open(&path).unwrap();
    let ph = store.monitor(&MonitorId::from("ph")).unwrap();
    assert_eq!(ph.execution_count, 1);
    assert_eq!(
        store.active_session().map(|s| s.id),
        Some(SessionId::from("s-1"))
    );
}

#[test]
fn recovery_helpers_reset_leftovers() {
    let (_dir, store) = open_store();
    let mut program = ActiveProgram {
        id: ProgramId::from("tomatoes"),
        definition_id: "tomatoes".to_string(),
        name: "Tomato feed".to_string(),
        status: ProgramStatus::Running,
        max_execution_time: None,
        cycles: vec![sprig_core::ActiveCycle::new("morning", "08:00")],
        skipped_cycles: Vec::new(),
        total_executions: 0,
        activated_at: at(0, 0),
    };
    program.cycles[0].is_currently_executing = true;
    store.upsert_program(program).unwrap();
    store
        .open_session(ExecutionSession::program("s-1", "tomatoes", "Tomato feed", at(8, 0)))
        .unwrap();
    store
        .defer(&flow("ph"), PausedBy::ExecutionActive, EntryId::from("q-1"), at(8, 0), HOUR)
        .unwrap();
    store.claim_next_pending().unwrap();

    let failed = store
        .fail_active_sessions("interrupted by restart", at(9, 0))
        .unwrap();
    let cleared = store.clear_executing_cycles().unwrap();
    let reset = store.reset_executing_entries().unwrap();

    assert_eq!(failed, vec![SessionId::from("s-1")]);
    assert_eq!(cleared, vec![CycleKey::new("tomatoes", "morning")]);
    assert_eq!(reset, 1);
    assert!(store.active_session().is_none());
    assert_eq!(
        store.session(&SessionId::from("s-1")).unwrap().error.as_deref(),
        Some("interrupted by restart")
    );
    assert!(store.has_pending());
}

#[test]
fn read_only_open_leaves_a_live_log_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprig.wal");
    {
        let store = Store::open(&path).unwrap();
        store.upsert_monitor(flow("ph")).unwrap();
        store.upsert_monitor(flow("ec")).unwrap();
    }
    // A writer caught between the entry and its newline
    let content = std::fs::read_to_string(&path).unwrap();
    let last = content.lines().last().unwrap().to_string();
    std::fs::write(&path, format!("{content}{last}")).unwrap();
    let before = std::fs::read(&path).unwrap();

    let store = Store::open_read_only(&path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(store.monitors().len(), 2);
    assert!(matches!(
        store.upsert_monitor(flow("temp")),
        Err(StoreError::ReadOnly)
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn read_only_open_does_not_create_a_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprig.wal");

    let store = Store::open_read_only(&path).unwrap();

    assert!(store.monitors().is_empty());
    assert!(!path.exists());
}

#[test]
fn appended_entries_end_with_a_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprig.wal");
    let store = Store::open(&path).unwrap();

    store.upsert_monitor(flow("ph")).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn rejected_writes_leave_state_unchanged() {
    let (_dir, store) = open_store();
    store.upsert_monitor(flow("ph")).unwrap();
    store.reject_writes(|op| matches!(op, Operation::MonitorRemove { .. }));

    assert!(store.remove_monitor(&MonitorId::from("ph")).is_err());
    assert_eq!(store.monitors().len(), 1);
    store.upsert_monitor(flow("ec")).unwrap();
}
