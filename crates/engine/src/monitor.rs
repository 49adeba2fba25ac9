// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring flow execution
//!
//! Monitoring yields to program cycles. A due flow runs directly only when the
//! hardware is idle and nothing is waiting in the queue; otherwise it is deferred.
//! Interruptions (preemption, a busy interpreter) defer the flow again rather than
//! counting as failures.

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowError, FlowInterpreter, NotifyAdapter};
use sprig_core::{
    CancellationToken, Clock, CycleId, ExecutionSession, IdGen, MonitoringFlow, PausedBy,
    RunStatus, SessionId, Variables,
};
use sprig_storage::{Admission, SchedulerStore};

/// Session cycle under which monitoring flows are recorded
pub const MONITORING_CYCLE: &str = "monitoring";

/// Result of processing or executing a monitoring flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Completed,
    /// Pushed to (or re-tagged in) the queue
    Deferred(PausedBy),
    Failed(String),
    /// Already running in this process
    Skipped,
}

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    /// Run a due monitoring flow, or defer it, then drain the queue
    pub async fn process_monitoring_flow(
        &self,
        flow: &MonitoringFlow,
    ) -> Result<MonitorOutcome, EngineError> {
        if self.running.is_monitor_running(&flow.id) {
            tracing::debug!(flow_id = %flow.id, "monitoring flow already running");
            return Ok(MonitorOutcome::Skipped);
        }
        let result = if self.hardware_busy() {
            self.defer(flow, PausedBy::ExecutionActive)
                .map(|_| MonitorOutcome::Deferred(PausedBy::ExecutionActive))
        } else if self.store.has_pending() {
            self.defer(flow, PausedBy::ScheduledConflict)
                .map(|_| MonitorOutcome::Deferred(PausedBy::ScheduledConflict))
        } else {
            self.execute_monitoring(flow).await
        };
        self.drain().await;
        result
    }

    /// Execute a monitoring flow now, under its own execution session
    ///
    /// Statistics are updated only for real outcomes: a flow that was interrupted or
    /// found the interpreter busy is deferred and keeps its counters.
    pub(crate) async fn execute_monitoring(
        &self,
        flow: &MonitoringFlow,
    ) -> Result<MonitorOutcome, EngineError> {
        let Some(token) = self.running.claim_monitor(&flow.id, self.clock.now()) else {
            return Ok(MonitorOutcome::Skipped);
        };
        let result = self.run_monitoring(flow, &token).await;
        self.running.release_monitor(&flow.id);
        result
    }

    async fn run_monitoring(
        &self,
        flow: &MonitoringFlow,
        token: &CancellationToken,
    ) -> Result<MonitorOutcome, EngineError> {
        let definition = match self.catalog.flow(&flow.flow) {
            Ok(definition) => definition,
            Err(e) => {
                let msg = e.to_string();
                tracing::error!(flow_id = %flow.id, error = %msg, "monitoring flow definition unavailable");
                self.store
                    .record_monitor_execution(&flow.id, self.clock.now(), Some(msg.clone()))?;
                return Ok(MonitorOutcome::Failed(msg));
            }
        };

        let session = ExecutionSession::monitoring(
            self.ids.next(),
            flow.id.as_str(),
            flow.name.as_str(),
            self.clock.now(),
        );
        let session_id = match self.store.open_session(session)? {
            Admission::Opened(id) | Admission::Joined(id) => id,
            Admission::Busy(active) => {
                tracing::info!(flow_id = %flow.id, blocking_session = %active.id, "hardware busy, deferring monitoring flow");
                self.defer(flow, PausedBy::ExecutionActive)?;
                return Ok(MonitorOutcome::Deferred(PausedBy::ExecutionActive));
            }
        };
        self.running.attach_session(&flow.id, &session_id);

        let cycle = CycleId::from(MONITORING_CYCLE);
        let now = self.clock.now();
        self.store.mark_session_running(&session_id)?;
        self.store.start_session_cycle(&session_id, &cycle, now)?;
        self.store
            .start_session_flow(&session_id, &cycle, &definition.id, &definition.name, now)?;
        tracing::info!(flow_id = %flow.id, session_id = %session_id, "monitoring flow started");

        let result = self
            .interpreter
            .execute(&definition, &monitoring_variables(flow), token)
            .await;

        let now = self.clock.now();
        match (result, token.reason()) {
            (Err(FlowError::Cancelled { reason }), _) | (_, Some(reason)) => {
                tracing::info!(flow_id = %flow.id, %reason, "monitoring flow interrupted");
                self.store.fail_session(&session_id, &reason, now)?;
                self.defer(flow, PausedBy::TimeoutInterrupt)?;
                Ok(MonitorOutcome::Deferred(PausedBy::TimeoutInterrupt))
            }
            (Ok(true), None) => {
                self.store.finish_session_flow(
                    &session_id,
                    &cycle,
                    &definition.id,
                    RunStatus::Completed,
                    None,
                    now,
                )?;
                self.store.complete_session(&session_id, now)?;
                self.store.record_monitor_execution(&flow.id, now, None)?;
                tracing::info!(flow_id = %flow.id, "monitoring flow completed");
                Ok(MonitorOutcome::Completed)
            }
            (Err(FlowError::SystemNotIdle), None) => {
                let reason = FlowError::SystemNotIdle.to_string();
                tracing::info!(flow_id = %flow.id, "interpreter busy, deferring monitoring flow");
                self.store.fail_session(&session_id, &reason, now)?;
                self.defer(flow, PausedBy::SystemBusy)?;
                Ok(MonitorOutcome::Deferred(PausedBy::SystemBusy))
            }
            (Ok(false), None) => {
                self.fail_monitoring(flow, &session_id, &definition.id, "flow reported failure".into())
            }
            (Err(e), None) => self.fail_monitoring(flow, &session_id, &definition.id, e.to_string()),
        }
    }

    fn fail_monitoring(
        &self,
        flow: &MonitoringFlow,
        session_id: &SessionId,
        flow_id: &str,
        error: String,
    ) -> Result<MonitorOutcome, EngineError> {
        let now = self.clock.now();
        tracing::warn!(flow_id = %flow.id, %error, "monitoring flow failed");
        self.store.finish_session_flow(
            session_id,
            &CycleId::from(MONITORING_CYCLE),
            flow_id,
            RunStatus::Failed,
            Some(error.clone()),
            now,
        )?;
        self.store.fail_session(session_id, &error, now)?;
        self.store
            .record_monitor_execution(&flow.id, now, Some(error.clone()))?;
        Ok(MonitorOutcome::Failed(error))
    }
}

fn monitoring_variables(flow: &MonitoringFlow) -> Variables {
    let mut vars = Variables::new();
    vars.insert("origin".into(), "monitoring".into());
    vars.insert("monitoring_flow_id".into(), flow.id.as_str().into());
    vars.insert("monitoring_flow_name".into(), flow.name.as_str().into());
    vars
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
