// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed store implementing the scheduler's store interfaces

use crate::state::MaterializedState;
use crate::traits::{
    Admission, Deferral, MonitorStore, ProgramStore, QueueStore, SessionStore,
};
use crate::wal::{Wal, WalError};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use sprig_core::{
    ActiveProgram, CycleId, CycleKey, DailyTracking, EntryId, EntryStatus, ExecutionSession,
    MonitorId, MonitoringFlow, Operation, PausedBy, ProgramId, ProgramStatus, QueueEntry,
    RunStatus, SessionId, SessionKind, SkippedCycle,
};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("store opened read-only")]
    ReadOnly,
}

struct Inner {
    /// `None` for a read-only store
    wal: Option<Wal>,
    state: MaterializedState,
    #[cfg(any(test, feature = "test-support"))]
    reject: Option<fn(&Operation) -> bool>,
}

impl Inner {
    /// Append to the log, then apply. State never runs ahead of the log.
    fn persist(&mut self, op: Operation) -> Result<(), StoreError> {
        #[cfg(any(test, feature = "test-support"))]
        if self.reject.is_some_and(|reject| reject(&op)) {
            return Err(WalError::Io(std::io::Error::other("write rejected")).into());
        }
        let wal = self.wal.as_mut().ok_or(StoreError::ReadOnly)?;
        wal.append(&op)?;
        self.state.apply(&op);
        Ok(())
    }
}

/// Durable store: a WAL plus the state materialized from it
pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    /// Open the store at `path`, replaying any existing log
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let state = Self::replay(path)?;
        let wal = Wal::open(path)?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self::with(Some(wal), state))
    }

    /// Load the state at `path` without opening the log for writing
    ///
    /// Safe while another process appends to the same log: the file is never
    /// created, truncated or locked. Every write fails with [`StoreError::ReadOnly`].
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let state = Self::replay(path)?;
        tracing::debug!(path = %path.display(), "store opened read-only");
        Ok(Self::with(None, state))
    }

    fn replay(path: &Path) -> Result<MaterializedState, StoreError> {
        let mut state = MaterializedState::default();
        for op in &Wal::replay(path)? {
            state.apply(op);
        }
        Ok(state)
    }

    fn with(wal: Option<Wal>, state: MaterializedState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                #[cfg(any(test, feature = "test-support"))]
                reject: None,
            }),
        }
    }

    /// Fail every later write whose operation matches `reject`, leaving state untouched
    #[cfg(any(test, feature = "test-support"))]
    pub fn reject_writes(&self, reject: fn(&Operation) -> bool) {
        self.lock().reject = Some(reject);
    }

    /// Persist a single operation
    pub fn persist(&self, op: Operation) -> Result<(), StoreError> {
        self.lock().persist(op)
    }

    /// A point-in-time copy of the whole state
    pub fn snapshot(&self) -> MaterializedState {
        self.lock().state.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        f(&self.lock().state)
    }
}

impl SessionStore for Store {
    fn active_session(&self) -> Option<ExecutionSession> {
        self.read(|s| s.active_session().cloned())
    }

    fn session(&self, id: &SessionId) -> Option<ExecutionSession> {
        self.read(|s| s.sessions.get(id).cloned())
    }

    fn open_session(&self, session: ExecutionSession) -> Result<Admission, StoreError> {
        let mut inner = self.lock();
        if let Some(active) = inner.state.active_session() {
            let same_program = active.kind == SessionKind::Program
                && session.kind == SessionKind::Program
                && active.source_id == session.source_id;
            return Ok(if same_program {
                Admission::Joined(active.id.clone())
            } else {
                Admission::Busy(active.clone())
            });
        }
        let id = session.id.clone();
        inner.persist(Operation::SessionOpen { session })?;
        Ok(Admission::Opened(id))
    }

    fn mark_session_running(&self, id: &SessionId) -> Result<(), StoreError> {
        self.persist(Operation::SessionRunning { id: id.clone() })
    }

    fn start_session_cycle(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::SessionCycleStart {
            id: id.clone(),
            cycle_id: cycle_id.clone(),
            at,
        })
    }

    fn finish_session_cycle(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::SessionCycleFinish {
            id: id.clone(),
            cycle_id: cycle_id.clone(),
            status,
            at,
        })
    }

    fn start_session_flow(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        flow_id: &str,
        flow_name: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::SessionFlowStart {
            id: id.clone(),
            cycle_id: cycle_id.clone(),
            flow_id: flow_id.to_string(),
            flow_name: flow_name.to_string(),
            at,
        })
    }

    fn finish_session_flow(
        &self,
        id: &SessionId,
        cycle_id: &CycleId,
        flow_id: &str,
        status: RunStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::SessionFlowFinish {
            id: id.clone(),
            cycle_id: cycle_id.clone(),
            flow_id: flow_id.to_string(),
            status,
            error,
            at,
        })
    }

    fn complete_session(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.persist(Operation::SessionComplete { id: id.clone(), at })
    }

    fn fail_session(
        &self,
        id: &SessionId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::SessionFail {
            id: id.clone(),
            reason: reason.to_string(),
            at,
        })
    }

    fn fail_active_sessions(
        &self,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<SessionId>, StoreError> {
        let mut inner = self.lock();
        let ids: Vec<SessionId> = inner.state.active_sessions().map(|s| s.id.clone()).collect();
        for id in &ids {
            inner.persist(Operation::SessionFail {
                id: id.clone(),
                reason: reason.to_string(),
                at,
            })?;
        }
        Ok(ids)
    }
}

impl QueueStore for Store {
    fn defer(
        &self,
        flow: &MonitoringFlow,
        paused_by: PausedBy,
        new_id: EntryId,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> Result<Deferral, StoreError> {
        let mut inner = self.lock();
        let open = inner
            .state
            .open_entry_for(&flow.id)
            .map(|e| (e.id.clone(), e.paused_by));
        if let Some((id, current)) = open {
            if current != paused_by {
                inner.persist(Operation::QueueRetag {
                    id: id.clone(),
                    paused_by,
                })?;
            }
            return Ok(Deferral::Retagged(id));
        }

        let retention = TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX);
        let before = now.checked_sub_signed(retention).unwrap_or(now);
        let stale = inner
            .state
            .queue
            .values()
            .any(|e| e.flow_id == flow.id && !e.is_open() && e.added_at < before);
        if stale {
            inner.persist(Operation::QueuePrune {
                flow_id: flow.id.clone(),
                before,
            })?;
        }

        let entry = QueueEntry::pending(
            new_id.clone(),
            flow.id.clone(),
            flow.name.clone(),
            paused_by,
            now,
        );
        inner.persist(Operation::QueuePush { entry })?;
        Ok(Deferral::Queued(new_id))
    }

    fn has_pending(&self) -> bool {
        self.read(|s| s.queue.values().any(|e| e.status == EntryStatus::Pending))
    }

    fn claim_next_pending(&self) -> Result<Option<QueueEntry>, StoreError> {
        let mut inner = self.lock();
        let Some(id) = inner
            .state
            .entries_with(EntryStatus::Pending)
            .first()
            .map(|e| e.id.clone())
        else {
            return Ok(None);
        };
        inner.persist(Operation::QueueExecuting { id: id.clone() })?;
        Ok(inner.state.queue.get(&id).cloned())
    }

    fn requeue_entry(&self, id: &EntryId) -> Result<(), StoreError> {
        self.persist(Operation::QueuePending { id: id.clone() })
    }

    fn fail_entry(&self, id: &EntryId, error: &str) -> Result<(), StoreError> {
        self.persist(Operation::QueueFailed {
            id: id.clone(),
            error: error.to_string(),
        })
    }

    fn delete_entry(&self, id: &EntryId) -> Result<(), StoreError> {
        self.persist(Operation::QueueDelete { id: id.clone() })
    }

    fn entries(&self) -> Vec<QueueEntry> {
        self.read(|s| {
            let mut entries: Vec<_> = s.queue.values().cloned().collect();
            entries.sort_by(QueueEntry::drain_order);
            entries
        })
    }

    fn reset_executing_entries(&self) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let ids: Vec<EntryId> = inner
            .state
            .entries_with(EntryStatus::Executing)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        for id in &ids {
            inner.persist(Operation::QueuePending { id: id.clone() })?;
        }
        Ok(ids.len())
    }
}

impl ProgramStore for Store {
    fn programs(&self) -> Vec<ActiveProgram> {
        self.read(|s| s.programs.values().cloned().collect())
    }

    fn program(&self, id: &ProgramId) -> Option<ActiveProgram> {
        self.read(|s| s.programs.get(id).cloned())
    }

    fn upsert_program(&self, program: ActiveProgram) -> Result<(), StoreError> {
        self.persist(Operation::ProgramUpsert { program })
    }

    fn remove_program(&self, id: &ProgramId) -> Result<(), StoreError> {
        self.persist(Operation::ProgramRemove { id: id.clone() })
    }

    fn set_program_status(
        &self,
        id: &ProgramId,
        status: ProgramStatus,
    ) -> Result<(), StoreError> {
        self.persist(Operation::ProgramStatusSet {
            id: id.clone(),
            status,
        })
    }

    fn skip_cycle(&self, program_id: &ProgramId, skip: SkippedCycle) -> Result<(), StoreError> {
        self.persist(Operation::CycleSkip {
            program_id: program_id.clone(),
            skip,
        })
    }

    fn cycle_started(
        &self,
        program_id: &ProgramId,
        cycle_id: &CycleId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::CycleStarted {
            program_id: program_id.clone(),
            cycle_id: cycle_id.clone(),
            at,
        })
    }

    fn cycle_finished(
        &self,
        program_id: &ProgramId,
        cycle_id: &CycleId,
    ) -> Result<(), StoreError> {
        self.persist(Operation::CycleFinished {
            program_id: program_id.clone(),
            cycle_id: cycle_id.clone(),
        })
    }

    fn clear_executing_cycles(&self) -> Result<Vec<CycleKey>, StoreError> {
        let mut inner = self.lock();
        let keys: Vec<CycleKey> = inner
            .state
            .programs
            .values()
            .flat_map(|p| {
                p.cycles
                    .iter()
                    .filter(|c| c.is_currently_executing)
                    .map(|c| CycleKey::new(p.id.clone(), c.cycle_id.clone()))
            })
            .collect();
        for key in &keys {
            inner.persist(Operation::CycleFinished {
                program_id: key.program_id.clone(),
                cycle_id: key.cycle_id.clone(),
            })?;
        }
        Ok(keys)
    }

    fn daily(&self) -> DailyTracking {
        self.read(|s| s.daily.clone())
    }

    fn reset_daily(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.persist(Operation::DailyReset { date })
    }

    fn record_daily_cycle(&self, key: CycleKey, succeeded: bool) -> Result<(), StoreError> {
        self.persist(Operation::DailyCycleRecorded { key, succeeded })
    }
}

impl MonitorStore for Store {
    fn monitors(&self) -> Vec<MonitoringFlow> {
        self.read(|s| s.monitors.values().cloned().collect())
    }

    fn monitor(&self, id: &MonitorId) -> Option<MonitoringFlow> {
        self.read(|s| s.monitors.get(id).cloned())
    }

    fn upsert_monitor(&self, flow: MonitoringFlow) -> Result<(), StoreError> {
        self.persist(Operation::MonitorUpsert { flow })
    }

    fn remove_monitor(&self, id: &MonitorId) -> Result<(), StoreError> {
        self.persist(Operation::MonitorRemove { id: id.clone() })
    }

    fn record_monitor_execution(
        &self,
        id: &MonitorId,
        at: DateTime<Utc>,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        self.persist(Operation::MonitorExecuted {
            id: id.clone(),
            at,
            error,
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
