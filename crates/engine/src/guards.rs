// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory record of executions owned by this process
//!
//! The persisted session is the authority for whether the hardware is busy. These sets
//! hold what the store cannot: cancellation handles, and cycles that have been claimed
//! by a tick but have not yet opened their session.

use chrono::{DateTime, Utc};
use sprig_core::{CancellationToken, CycleKey, MonitorId, ProgramId, SessionId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct RunningCycle {
    pub started_at: DateTime<Utc>,
    pub max_execution: Duration,
    pub token: CancellationToken,
}

#[derive(Debug, Clone)]
pub(crate) struct RunningMonitor {
    pub started_at: DateTime<Utc>,
    pub token: CancellationToken,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Default)]
pub(crate) struct RunningSet {
    cycles: Mutex<HashMap<CycleKey, RunningCycle>>,
    monitors: Mutex<HashMap<MonitorId, RunningMonitor>>,
}

impl RunningSet {
    /// Claim a cycle for execution
    ///
    /// Returns `None` when the program already has a cycle claimed.
    pub fn claim_cycle(
        &self,
        key: &CycleKey,
        started_at: DateTime<Utc>,
        max_execution: Duration,
    ) -> Option<CancellationToken> {
        let mut cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
        if cycles.keys().any(|k| k.program_id == key.program_id) {
            return None;
        }
        let token = CancellationToken::new();
        cycles.insert(
            key.clone(),
            RunningCycle {
                started_at,
                max_execution,
                token: token.clone(),
            },
        );
        Some(token)
    }

    pub fn release_cycle(&self, key: &CycleKey) {
        self.cycles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    pub fn has_cycles(&self) -> bool {
        !self
            .cycles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Cancel every claimed cycle of a program, returning how many were signalled
    pub fn cancel_program(&self, program_id: &ProgramId, reason: &str) -> usize {
        let cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
        let mut cancelled = 0;
        for (key, cycle) in cycles.iter() {
            if &key.program_id == program_id {
                cycle.token.cancel(reason);
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn cycles(&self) -> Vec<(CycleKey, RunningCycle)> {
        let cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<_> = cycles
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Claim a monitoring flow for execution; `None` if it is already running
    pub fn claim_monitor(
        &self,
        id: &MonitorId,
        started_at: DateTime<Utc>,
    ) -> Option<CancellationToken> {
        let mut monitors = self.monitors.lock().unwrap_or_else(|e| e.into_inner());
        if monitors.contains_key(id) {
            return None;
        }
        let token = CancellationToken::new();
        monitors.insert(
            id.clone(),
            RunningMonitor {
                started_at,
                token: token.clone(),
                session_id: None,
            },
        );
        Some(token)
    }

    pub fn attach_session(&self, id: &MonitorId, session_id: &SessionId) {
        let mut monitors = self.monitors.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(monitor) = monitors.get_mut(id) {
            monitor.session_id = Some(session_id.clone());
        }
    }

    pub fn release_monitor(&self, id: &MonitorId) {
        self.monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
    }

    pub fn is_monitor_running(&self, id: &MonitorId) -> bool {
        self.monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn has_monitors(&self) -> bool {
        !self
            .monitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Cancellation handle of the monitoring flow running under `session_id`
    pub fn monitor_token(&self, session_id: &SessionId) -> Option<CancellationToken> {
        let monitors = self.monitors.lock().unwrap_or_else(|e| e.into_inner());
        monitors
            .values()
            .find(|m| m.session_id.as_ref() == Some(session_id))
            .map(|m| m.token.clone())
    }

    pub fn monitors(&self) -> Vec<(MonitorId, RunningMonitor)> {
        let monitors = self.monitors.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<_> = monitors
            .iter()
            .map(|(k, m)| (k.clone(), m.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Cancel everything, returning how many executions were signalled
    pub fn cancel_all(&self, reason: &str) -> usize {
        let cycles = self.cycles.lock().unwrap_or_else(|e| e.into_inner());
        let monitors = self.monitors.lock().unwrap_or_else(|e| e.into_inner());
        for cycle in cycles.values() {
            cycle.token.cancel(reason);
        }
        for monitor in monitors.values() {
            monitor.token.cancel(reason);
        }
        cycles.len() + monitors.len()
    }
}

#[cfg(test)]
#[path = "guards_tests.rs"]
mod tests;
