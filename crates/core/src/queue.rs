// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring queue entries
//!
//! The queue holds monitoring flows that could not run when they became due. It is
//! durable, drained in priority then arrival order, and keeps at most one open entry
//! (pending or executing) per monitoring flow.

use crate::id::{EntryId, MonitorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Why a monitoring flow was deferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausedBy {
    /// Another execution owned the hardware
    ExecutionActive,
    /// Older entries were already waiting
    ScheduledConflict,
    /// The interpreter reported the system was not idle
    SystemBusy,
    /// Preempted by a program cycle
    TimeoutInterrupt,
}

impl std::fmt::Display for PausedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PausedBy::ExecutionActive => "execution_active",
            PausedBy::ScheduledConflict => "scheduled_conflict",
            PausedBy::SystemBusy => "system_busy",
            PausedBy::TimeoutInterrupt => "timeout_interrupt",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, EntryStatus::Pending | EntryStatus::Executing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub flow_id: MonitorId,
    pub flow_name: String,
    pub paused_by: PausedBy,
    pub status: EntryStatus,
    /// Lower drains first
    #[serde(default)]
    pub priority: u32,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub execution_attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl QueueEntry {
    pub fn pending(
        id: impl Into<EntryId>,
        flow_id: MonitorId,
        flow_name: impl Into<String>,
        paused_by: PausedBy,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            flow_id,
            flow_name: flow_name.into(),
            paused_by,
            status: EntryStatus::Pending,
            priority: 0,
            added_at,
            execution_attempts: 0,
            last_error: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Drain order: priority, then arrival, then id for a stable tie-break
    pub fn drain_order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.added_at.cmp(&b.added_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
