// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log
//!
//! Every durable change to programs, sessions, monitoring flows, the queue and daily
//! tracking is one of these. Timestamps are carried in the operation so replay
//! reproduces state exactly.

use crate::id::{CycleId, EntryId, MonitorId, ProgramId, SessionId};
use crate::monitoring::MonitoringFlow;
use crate::program::{ActiveProgram, CycleKey, ProgramStatus, SkippedCycle};
use crate::queue::{PausedBy, QueueEntry};
use crate::session::{ExecutionSession, RunStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or replace an activated program
    ProgramUpsert { program: ActiveProgram },

    ProgramRemove { id: ProgramId },

    ProgramStatusSet { id: ProgramId, status: ProgramStatus },

    /// Suppress a cycle until a given instant
    CycleSkip {
        program_id: ProgramId,
        skip: SkippedCycle,
    },

    /// A cycle began: flags it executing and bumps its counters
    CycleStarted {
        program_id: ProgramId,
        cycle_id: CycleId,
        at: DateTime<Utc>,
    },

    /// A cycle ended, however it ended
    CycleFinished {
        program_id: ProgramId,
        cycle_id: CycleId,
    },

    SessionOpen { session: ExecutionSession },

    SessionRunning { id: SessionId },

    SessionCycleStart {
        id: SessionId,
        cycle_id: CycleId,
        at: DateTime<Utc>,
    },

    SessionCycleFinish {
        id: SessionId,
        cycle_id: CycleId,
        status: RunStatus,
        at: DateTime<Utc>,
    },

    SessionFlowStart {
        id: SessionId,
        cycle_id: CycleId,
        flow_id: String,
        flow_name: String,
        at: DateTime<Utc>,
    },

    SessionFlowFinish {
        id: SessionId,
        cycle_id: CycleId,
        flow_id: String,
        status: RunStatus,
        #[serde(default)]
        error: Option<String>,
        at: DateTime<Utc>,
    },

    SessionComplete { id: SessionId, at: DateTime<Utc> },

    SessionFail {
        id: SessionId,
        reason: String,
        at: DateTime<Utc>,
    },

    /// Insert or replace a monitoring flow
    MonitorUpsert { flow: MonitoringFlow },

    MonitorRemove { id: MonitorId },

    /// Statistics after a monitoring execution
    MonitorExecuted {
        id: MonitorId,
        at: DateTime<Utc>,
        #[serde(default)]
        error: Option<String>,
    },

    QueuePush { entry: QueueEntry },

    /// Re-tag an open entry instead of adding a duplicate
    QueueRetag { id: EntryId, paused_by: PausedBy },

    /// Pending -> executing, counting the attempt
    QueueExecuting { id: EntryId },

    /// Back to pending (deferred again, or recovered after a restart)
    QueuePending { id: EntryId },

    QueueFailed { id: EntryId, error: String },

    QueueDelete { id: EntryId },

    /// Drop a flow's terminal entries added before `before`
    QueuePrune {
        flow_id: MonitorId,
        before: DateTime<Utc>,
    },

    DailyReset { date: NaiveDate },

    DailyCycleRecorded { key: CycleKey, succeeded: bool },
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
