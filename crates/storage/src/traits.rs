// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow store interfaces consumed by the scheduler

use crate::store::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use sprig_core::{
    ActiveProgram, CycleId, CycleKey, DailyTracking, EntryId, ExecutionSession, MonitorId,
    MonitoringFlow, PausedBy, ProgramId, ProgramStatus, QueueEntry, RunStatus, SessionId,
    SkippedCycle,
};
use std::time::Duration;

/// Result of asking for exclusive use of the hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The session was recorded and is now the active one
    Opened(SessionId),
    /// An active program session of the same program was reused
    Joined(SessionId),
    /// Another session is active
    Busy(ExecutionSession),
}

/// Result of deferring a monitoring flow to the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferral {
    Queued(EntryId),
    /// The flow already had an open entry; its reason was updated
    Retagged(EntryId),
}

impl Deferral {
    pub fn entry_id(&self) -> &EntryId {
        match self {
            Deferral::Queued(id) | Deferral::Retagged(id) => id,
        }
    }
}

/// Execution sessions: the single authority for "is the hardware busy"
pub trait SessionStore: Send + Sync + 'static {
    fn active_session(&self) -> Option<ExecutionSession>;

    fn session(&self, id: &SessionId) -> Option<ExecutionSession>;

    /// Record `session` only if no other session is active
    ///
    /// Program sessions join an active session of the same program instead.
    fn open_session(&self, session: ExecutionSession) -> Result<Admission, StoreError>;

    fn mark_session_running(&self, id: &SessionId) -> Result<(), StoreError>;

    fn start_session_cycle(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn finish_session_cycle(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn start_session_flow(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        flow_id: &str,
        flow_name: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn finish_session_flow(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        flow_id: &str,
        status: RunStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn complete_session(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError>;

    fn fail_session(&self, id: &SessionId, reason: &str, at: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Fail every active session, returning the ids failed
    fn fail_active_sessions(
        &self,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<SessionId>, StoreError>;
}

/// The durable monitoring queue
pub trait QueueStore: Send + Sync + 'static {
    /// Add a pending entry for `flow`, or re-tag its open entry
    ///
    /// Before adding, the flow's terminal entries older than `retention` are pruned.
    fn defer(
        &self,
        flow: &MonitoringFlow,
        paused_by: PausedBy,
        new_id: EntryId,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Result<Deferral, StoreError>;

    fn has_pending(&self) -> bool;

    /// Take the next pending entry in drain order, marking it executing
    fn claim_next_pending(&self) -> Result<Option<QueueEntry>, StoreError>;

    fn requeue_entry(&self, id: &EntryId) -> Result<(), StoreError>;

    fn fail_entry(&self, id: &EntryId, error: &str) -> Result<(), StoreError>;

    fn delete_entry(&self, id: &EntryId) -> Result<(), StoreError>;

    /// All entries in drain order
    fn entries(&self) -> Vec<QueueEntry>;

    /// Return executing entries to pending, returning how many were reset
    fn reset_executing_entries(&self) -> Result<usize, StoreError>;
}

/// Activated programs, their cycles and daily tracking
pub trait ProgramStore: Send + Sync + 'static {
    fn programs(&self) -> Vec<ActiveProgram>;

    fn program(&self, id: &ProgramId) -> Option<ActiveProgram>;

    fn upsert_program(&self, program: ActiveProgram) -> Result<(), StoreError>;

    fn remove_program(&self, id: &ProgramId) -> Result<(), StoreError>;

    fn set_program_status(&self, id: &ProgramId, status: ProgramStatus)
        -> Result<(), StoreError>;

    fn skip_cycle(&self, program_id: &ProgramId, skip: SkippedCycle) -> Result<(), StoreError>;

    fn cycle_started(
        &self,
        program_id: &ProgramId,
        cycle_id: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn cycle_finished(&self, program_id: &ProgramId, cycle_id: &CycleId)
        -> Result<(), StoreError>;

    /// Clear every executing flag, returning the cycles cleared
    fn clear_executing_cycles(&self) -> Result<Vec<CycleKey>, StoreError>;

    fn daily(&self) -> DailyTracking;

    fn reset_daily(&self, date: NaiveDate) -> Result<(), StoreError>;

    fn record_daily_cycle(&self, key: CycleKey, succeeded: bool) -> Result<(), StoreError>;
}

/// Recurring monitoring flows
pub trait MonitorStore: Send + Sync + 'static {
    fn monitors(&self) -> Vec<MonitoringFlow>;

    fn monitor(&self, id: &MonitorId) -> Option<MonitoringFlow>;

    fn upsert_monitor(&self, flow: MonitoringFlow) -> Result<(), StoreError>;

    fn remove_monitor(&self, id: &MonitorId) -> Result<(), StoreError>;

    fn record_monitor_execution(
        &self,
        id: &MonitorId,
        at: DateTime<Utc>,
        error: Option<String>,
    ) -> Result<(), StoreError>;
}

/// Everything the scheduler needs from storage
pub trait SchedulerStore: SessionStore + QueueStore + ProgramStore + MonitorStore {}

impl<T: SessionStore + QueueStore + ProgramStore + MonitorStore> SchedulerStore for T {}
