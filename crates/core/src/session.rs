// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution sessions
//!
//! A session records one exclusive use of the hardware. Program sessions group the
//! cycles run under one program; monitoring sessions wrap a single monitoring flow.
//! At most one session is active (starting or running) at any time.

use crate::id::{CycleId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a session executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Program,
    Monitoring,
}

/// Session-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Starting | SessionStatus::Running)
    }
}

/// Status of a cycle or flow run within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// One flow executed within a cycle run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRun {
    pub flow_id: String,
    pub flow_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// One cycle executed within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRun {
    pub cycle_id: CycleId,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    #[serde(default)]
    pub flows: Vec<FlowRun>,
}

impl CycleRun {
    fn close(&mut self, status: RunStatus, at: DateTime<Utc>) {
        self.status = status;
        self.ended_at = Some(at);
        for flow in self.flows.iter_mut().filter(|f| !f.status.is_terminal()) {
            flow.status = status;
            flow.ended_at = Some(at);
        }
    }
}

/// Record of one exclusive hardware session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSession {
    pub id: SessionId,
    pub kind: SessionKind,
    /// Program id, or monitoring flow id for monitoring sessions
    pub source_id: String,
    pub source_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub cycles: Vec<CycleRun>,
}

impl ExecutionSession {
    /// A program session, running from the start
    pub fn program(
        id: impl Into<SessionId>,
        program_id: impl Into<String>,
        program_name: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: SessionKind::Program,
            source_id: program_id.into(),
            source_name: program_name.into(),
            started_at: at,
            ended_at: None,
            status: SessionStatus::Running,
            error: None,
            cycles: Vec::new(),
        }
    }

    /// A monitoring session, starting until the flow begins
    pub fn monitoring(
        id: impl Into<SessionId>,
        flow_id: impl Into<String>,
        flow_name: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: SessionKind::Monitoring,
            source_id: flow_id.into(),
            source_name: flow_name.into(),
            started_at: at,
            ended_at: None,
            status: SessionStatus::Starting,
            error: None,
            cycles: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_monitoring(&self) -> bool {
        self.kind == SessionKind::Monitoring
    }

    pub fn cycle_run(&self, cycle_id: &CycleId) -> Option<&CycleRun> {
        self.cycles.iter().rev().find(|c| &c.cycle_id == cycle_id)
    }

    fn cycle_run_mut(&mut self, cycle_id: &CycleId) -> Option<&mut CycleRun> {
        self.cycles.iter_mut().rev().find(|c| &c.cycle_id == cycle_id)
    }

    pub fn mark_running(&mut self) {
        if self.status == SessionStatus::Starting {
            self.status = SessionStatus::Running;
        }
    }

    /// Record a cycle start. A cycle already running under this session is left as is.
    pub fn start_cycle(&mut self, cycle_id: CycleId, at: DateTime<Utc>) {
        if self
            .cycle_run(&cycle_id)
            .is_some_and(|c| c.status == RunStatus::Running)
        {
            return;
        }
        self.cycles.push(CycleRun {
            cycle_id,
            started_at: at,
            ended_at: None,
            status: RunStatus::Running,
            flows: Vec::new(),
        });
    }

    /// Close a cycle run, completing the session once every cycle is terminal
    pub fn finish_cycle(&mut self, cycle_id: &CycleId, status: RunStatus, at: DateTime<Utc>) {
        if let Some(run) = self.cycle_run_mut(cycle_id) {
            run.close(status, at);
        }
        if self.is_active() && self.all_cycles_terminal() {
            self.status = SessionStatus::Completed;
            self.ended_at = Some(at);
        }
    }

    pub fn start_flow(
        &mut self,
        cycle_id: &CycleId,
        flow_id: impl Into<String>,
        flow_name: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        if let Some(run) = self.cycle_run_mut(cycle_id) {
            run.flows.push(FlowRun {
                flow_id: flow_id.into(),
                flow_name: flow_name.into(),
                started_at: at,
                ended_at: None,
                status: RunStatus::Running,
                error: None,
            });
        }
    }

    pub fn finish_flow(
        &mut self,
        cycle_id: &CycleId,
        flow_id: &str,
        status: RunStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) {
        let Some(run) = self.cycle_run_mut(cycle_id) else {
            return;
        };
        if let Some(flow) = run
            .flows
            .iter_mut()
            .rev()
            .find(|f| f.flow_id == flow_id && !f.status.is_terminal())
        {
            flow.status = status;
            flow.error = error;
            flow.ended_at = Some(at);
        }
    }

    /// Mark the session completed, closing anything still running
    pub fn complete(&mut self, at: DateTime<Utc>) {
        if !self.is_active() {
            return;
        }
        for run in self.cycles.iter_mut().filter(|c| !c.status.is_terminal()) {
            run.close(RunStatus::Completed, at);
        }
        self.status = SessionStatus::Completed;
        self.ended_at = Some(at);
    }

    /// Mark the session failed, failing anything still running
    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        if !self.is_active() {
            return;
        }
        for run in self.cycles.iter_mut().filter(|c| !c.status.is_terminal()) {
            run.close(RunStatus::Failed, at);
        }
        self.status = SessionStatus::Failed;
        self.error = Some(reason.into());
        self.ended_at = Some(at);
    }

    fn all_cycles_terminal(&self) -> bool {
        !self.cycles.is_empty() && self.cycles.iter().all(|c| c.status.is_terminal())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
