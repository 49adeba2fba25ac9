// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring monitoring flows
//!
//! A monitoring flow reads sensors on a fixed interval. It yields to program cycles:
//! when it cannot run it is deferred to the monitoring queue instead of being dropped.

use crate::id::MonitorId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Interval bounds, in minutes
pub const MIN_INTERVAL_MINUTES: u32 = 1;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringFlow {
    pub id: MonitorId,
    /// Flow definition run on each execution
    pub flow: String,
    pub name: String,
    pub interval_minutes: u32,
    pub is_active: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_execution: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl MonitoringFlow {
    /// A new active flow, first due one interval from `now`
    pub fn new(
        id: impl Into<MonitorId>,
        flow: impl Into<String>,
        name: impl Into<String>,
        interval_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let interval_minutes = interval_minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);
        Self {
            id: id.into(),
            flow: flow.into(),
            name: name.into(),
            interval_minutes,
            is_active: true,
            last_executed: None,
            next_execution: Some(now + TimeDelta::minutes(i64::from(interval_minutes))),
            execution_count: 0,
            last_error: None,
        }
    }

    pub fn interval(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.interval_minutes))
    }

    /// Due when active and the next execution time has arrived (or was never set)
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_execution.is_none_or(|next| next <= now)
    }

    /// Update statistics after an execution attempt finished
    pub fn record_execution(&mut self, at: DateTime<Utc>, error: Option<String>) {
        self.last_executed = Some(at);
        self.execution_count += 1;
        self.next_execution = Some(at + self.interval());
        self.last_error = error;
    }

    /// Copy runtime counters from a previous version of the same flow
    pub fn carry_state_from(&mut self, previous: &MonitoringFlow) {
        self.last_executed = previous.last_executed;
        self.execution_count = previous.execution_count;
        self.last_error = previous.last_error.clone();
        self.next_execution = previous.next_execution;
        if self.interval_minutes != previous.interval_minutes {
            if let Some(last) = self.last_executed {
                self.next_execution = Some(last + self.interval());
            }
        }
    }
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
