// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activated programs and their daily cycles
//!
//! A program is activated from the catalog and then carries the scheduling state of each
//! cycle: whether it is enabled, whether it is running right now, and how often it ran.

use crate::clock::same_local_minute;
use crate::flow::Variables;
use crate::id::{CycleId, ProgramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of an activated program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    #[default]
    Running,
    Paused,
    Stopped,
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramStatus::Running => write!(f, "running"),
            ProgramStatus::Paused => write!(f, "paused"),
            ProgramStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// One step of a cycle: a flow plus variable overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub name: String,
    pub flow: String,
    #[serde(default)]
    pub overrides: Variables,
}

/// A cycle suppressed until a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCycle {
    pub cycle_id: CycleId,
    pub skip_until: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Scheduling state of one cycle within an active program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCycle {
    pub cycle_id: CycleId,
    /// Local time of day, `HH:MM`
    pub start_time: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_currently_executing: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_count: u64,
}

impl ActiveCycle {
    pub fn new(cycle_id: impl Into<CycleId>, start_time: impl Into<String>) -> Self {
        Self {
            cycle_id: cycle_id.into(),
            start_time: start_time.into(),
            is_active: true,
            is_currently_executing: false,
            last_executed: None,
            execution_count: 0,
        }
    }
}

/// Addresses a cycle across programs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleKey {
    pub program_id: ProgramId,
    pub cycle_id: CycleId,
}

impl CycleKey {
    pub fn new(program_id: impl Into<ProgramId>, cycle_id: impl Into<CycleId>) -> Self {
        Self {
            program_id: program_id.into(),
            cycle_id: cycle_id.into(),
        }
    }
}

impl std::fmt::Display for CycleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.program_id, self.cycle_id)
    }
}

/// An activated program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveProgram {
    pub id: ProgramId,
    /// Catalog program this activation was created from
    pub definition_id: String,
    pub name: String,
    #[serde(default)]
    pub status: ProgramStatus,
    #[serde(with = "humantime_serde", default)]
    pub max_execution_time: Option<Duration>,
    #[serde(default)]
    pub cycles: Vec<ActiveCycle>,
    #[serde(default)]
    pub skipped_cycles: Vec<SkippedCycle>,
    #[serde(default)]
    pub total_executions: u64,
    pub activated_at: DateTime<Utc>,
}

impl ActiveProgram {
    pub fn cycle(&self, cycle_id: &CycleId) -> Option<&ActiveCycle> {
        self.cycles.iter().find(|c| &c.cycle_id == cycle_id)
    }

    pub fn cycle_mut(&mut self, cycle_id: &CycleId) -> Option<&mut ActiveCycle> {
        self.cycles.iter_mut().find(|c| &c.cycle_id == cycle_id)
    }

    pub fn is_running(&self) -> bool {
        self.status == ProgramStatus::Running
    }

    pub fn has_executing_cycle(&self) -> bool {
        self.cycles.iter().any(|c| c.is_currently_executing)
    }

    /// A cycle is skipped while any skip entry for it is still in the future
    pub fn is_cycle_skipped(&self, cycle_id: &CycleId, now: DateTime<Utc>) -> bool {
        self.skipped_cycles
            .iter()
            .any(|s| &s.cycle_id == cycle_id && s.skip_until > now)
    }

    /// Cycles whose start time matches `hhmm` and that may start now
    ///
    /// A cycle that already started within the current local minute is not due again.
    pub fn due_cycles(&self, hhmm: &str, now: DateTime<Utc>) -> Vec<&ActiveCycle> {
        if !self.is_running() {
            return Vec::new();
        }
        self.cycles
            .iter()
            .filter(|c| c.is_active && !c.is_currently_executing && c.start_time == hhmm)
            .filter(|c| !self.is_cycle_skipped(&c.cycle_id, now))
            .filter(|c| !c.last_executed.is_some_and(|at| same_local_minute(at, now)))
            .collect()
    }

    /// Wall-clock budget for one cycle run
    pub fn max_execution(&self, default: Duration) -> Duration {
        self.max_execution_time.unwrap_or(default)
    }

    /// Copy runtime counters from a previous activation of the same program
    ///
    /// Used when the catalog is re-synced: definitions may change, history must not.
    pub fn carry_state_from(&mut self, previous: &ActiveProgram) {
        self.status = previous.status;
        self.total_executions = previous.total_executions;
        self.activated_at = previous.activated_at;
        self.skipped_cycles = previous.skipped_cycles.clone();
        for cycle in &mut self.cycles {
            if let Some(old) = previous.cycle(&cycle.cycle_id) {
                cycle.is_currently_executing = old.is_currently_executing;
                cycle.last_executed = old.last_executed;
                cycle.execution_count = old.execution_count;
            }
        }
    }
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
