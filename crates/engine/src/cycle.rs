// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Program cycle execution
//!
//! A cycle takes the hardware (preempting monitoring if needed), runs its actions in
//! order and stops at the first failure. A failed cycle never disables its program:
//! the next scheduled occurrence runs as usual.

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowError, FlowInterpreter, NotifyAdapter};
use sprig_core::{
    ActionTemplate, ActiveProgram, CancellationToken, Clock, CycleKey, ExecutionSession, IdGen,
    RunStatus, SessionId, Variables,
};
use sprig_storage::{Admission, SchedulerStore};
use std::fmt;
use std::sync::Arc;

/// Why a cycle stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleFailure {
    /// The interpreter's pre-run checks rejected the hardware state
    HardwareValidation(Vec<String>),
    Flow(String),
    Cancelled(String),
    /// The cycle's actions or flows could not be resolved
    Setup(String),
}

impl CycleFailure {
    fn title(&self) -> &'static str {
        match self {
            CycleFailure::HardwareValidation(_) => "Cycle aborted: hardware validation failed",
            CycleFailure::Cancelled(_) => "Cycle cancelled",
            CycleFailure::Flow(_) | CycleFailure::Setup(_) => "Cycle failed",
        }
    }
}

impl fmt::Display for CycleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleFailure::HardwareValidation(failures) => {
                write!(f, "hardware validation failed: {}", failures.join("; "))
            }
            CycleFailure::Flow(msg) | CycleFailure::Setup(msg) => write!(f, "{msg}"),
            CycleFailure::Cancelled(reason) => write!(f, "cancelled: {reason}"),
        }
    }
}

enum CycleEnd {
    Completed,
    Failed(CycleFailure),
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
    /// Run a claimed cycle to completion, then release it and drain the queue
    pub(crate) async fn run_cycle(self: Arc<Self>, key: CycleKey, token: CancellationToken) {
        let result = {
            let _lane = self.cycle_lane.lock().await;
            self.drive_cycle(&key, &token).await
        };
        if let Err(e) = result {
            tracing::error!(program_id = %key.program_id, cycle_id = %key.cycle_id, error = %e, "cycle run failed");
            if let Err(e) = self.store.cycle_finished(&key.program_id, &key.cycle_id) {
                tracing::error!(error = %e, "failed to clear executing flag");
            }
        }
        self.running.release_cycle(&key);
        self.drain().await;
    }

    async fn drive_cycle(&self, key: &CycleKey, token: &CancellationToken) -> Result<(), EngineError> {
        let Some(program) = self.store.program(&key.program_id) else {
            tracing::warn!(program_id = %key.program_id, "program removed before its cycle started");
            return Ok(());
        };
        let Some(session_id) = self.acquire_hardware(&program).await? else {
            return Ok(());
        };

        let result = self.run_in_session(&program, key, &session_id, token).await;
        if let Err(e) = &result {
            self.abandon_session(key, &session_id, e);
        }
        result
    }

    async fn run_in_session(
        &self,
        program: &ActiveProgram,
        key: &CycleKey,
        session_id: &SessionId,
        token: &CancellationToken,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store.cycle_started(&key.program_id, &key.cycle_id, now)?;
        self.store.start_session_cycle(session_id, &key.cycle_id, now)?;
        tracing::info!(program_id = %key.program_id, cycle_id = %key.cycle_id, session_id = %session_id, "cycle started");
        self.announce(
            "Cycle started",
            format!("{}: cycle {}", program.name, key.cycle_id),
        )
        .await;

        let end = self.run_actions(program, key, session_id, token).await?;
        self.finish_cycle(program, key, session_id, end).await
    }

    /// Fail a session whose cycle stopped on a store error, so the hardware is free again
    ///
    /// Best effort: the store may still be failing.
    fn abandon_session(&self, key: &CycleKey, session_id: &SessionId, error: &EngineError) {
        let Some(session) = self.store.session(session_id).filter(|s| s.is_active()) else {
            return;
        };
        let now = self.clock.now();
        if session.cycle_run(&key.cycle_id).is_some() {
            if let Err(e) =
                self.store
                    .finish_session_cycle(session_id, &key.cycle_id, RunStatus::Failed, now)
            {
                tracing::error!(session_id = %session_id, error = %e, "failed to close cycle record");
            }
        }
        if let Err(e) = self.store.fail_session(session_id, &error.to_string(), now) {
            tracing::error!(session_id = %session_id, error = %e, "failed to release session");
        }
    }

    /// Open a program session, waiting out or preempting whatever holds the hardware
    ///
    /// Returns `None` if another program's session stayed active past the wait bound.
    async fn acquire_hardware(
        &self,
        program: &ActiveProgram,
    ) -> Result<Option<SessionId>, EngineError> {
        let bound = self.config.preempt_timeout + self.config.graceful_stop;
        let started = tokio::time::Instant::now();
        loop {
            let session = ExecutionSession::program(
                self.ids.next(),
                program.id.as_str(),
                program.name.as_str(),
                self.clock.now(),
            );
            match self.store.open_session(session)? {
                Admission::Opened(id) | Admission::Joined(id) => return Ok(Some(id)),
                Admission::Busy(active) if active.is_monitoring() => {
                    self.wait_or_preempt(&active, &program.name).await?;
                }
                Admission::Busy(active) => {
                    if started.elapsed() >= bound {
                        tracing::error!(
                            program_id = %program.id,
                            blocking_session = %active.id,
                            blocking_source = %active.source_id,
                            "hardware held by another program, cycle not started"
                        );
                        return Ok(None);
                    }
                    tokio::time::sleep(self.config.preempt_poll).await;
                }
            }
        }
    }

    async fn run_actions(
        &self,
        program: &ActiveProgram,
        key: &CycleKey,
        session_id: &SessionId,
        token: &CancellationToken,
    ) -> Result<CycleEnd, EngineError> {
        let actions = match self
            .catalog
            .cycle_actions(&program.definition_id, key.cycle_id.as_str())
        {
            Ok(actions) => actions,
            Err(e) => return Ok(CycleEnd::Failed(CycleFailure::Setup(e.to_string()))),
        };

        for (index, action) in actions.iter().enumerate() {
            if let Err(reason) = token.checkpoint() {
                return Ok(CycleEnd::Failed(CycleFailure::Cancelled(reason)));
            }
            let flow = match self.catalog.flow(&action.flow) {
                Ok(flow) => flow,
                Err(e) => return Ok(CycleEnd::Failed(CycleFailure::Setup(e.to_string()))),
            };

            self.store.start_session_flow(
                session_id,
                &key.cycle_id,
                &flow.id,
                &action.name,
                self.clock.now(),
            )?;
            tracing::info!(program_id = %key.program_id, cycle_id = %key.cycle_id, action = %action.name, index, "action started");

            let notices = self.interpreter.subscribe();
            let variables = action_variables(key, action, index);
            let failure = match self.interpreter.execute(&flow, &variables, token).await {
                Ok(true) => None,
                Ok(false) => Some(CycleFailure::Flow(format!(
                    "action {} reported failure",
                    action.name
                ))),
                Err(FlowError::HardwareValidation { failures }) => {
                    Some(CycleFailure::HardwareValidation(failures))
                }
                Err(FlowError::Cancelled { reason }) => Some(CycleFailure::Cancelled(reason)),
                Err(e) => Some(CycleFailure::Flow(format!("action {}: {e}", action.name))),
            };

            if let Some(failure) = failure {
                self.store.finish_session_flow(
                    session_id,
                    &key.cycle_id,
                    &flow.id,
                    RunStatus::Failed,
                    Some(failure.to_string()),
                    self.clock.now(),
                )?;
                return Ok(CycleEnd::Failed(failure));
            }

            self.wait_settled(notices, &flow.id).await;
            self.store.finish_session_flow(
                session_id,
                &key.cycle_id,
                &flow.id,
                RunStatus::Completed,
                None,
                self.clock.now(),
            )?;
        }
        Ok(CycleEnd::Completed)
    }

    async fn finish_cycle(
        &self,
        program: &ActiveProgram,
        key: &CycleKey,
        session_id: &SessionId,
        end: CycleEnd,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        self.store.cycle_finished(&key.program_id, &key.cycle_id)?;
        match end {
            CycleEnd::Completed => {
                self.store
                    .finish_session_cycle(session_id, &key.cycle_id, RunStatus::Completed, now)?;
                self.store.record_daily_cycle(key.clone(), true)?;
                tracing::info!(program_id = %key.program_id, cycle_id = %key.cycle_id, "cycle completed");
                self.announce(
                    "Cycle succeeded",
                    format!("{}: cycle {}", program.name, key.cycle_id),
                )
                .await;
            }
            CycleEnd::Failed(failure) => {
                self.store
                    .finish_session_cycle(session_id, &key.cycle_id, RunStatus::Failed, now)?;
                self.store.record_daily_cycle(key.clone(), false)?;
                match &failure {
                    CycleFailure::HardwareValidation(_) => tracing::warn!(
                        program_id = %key.program_id,
                        cycle_id = %key.cycle_id,
                        reason = %failure,
                        "cycle aborted, program stays scheduled"
                    ),
                    _ => tracing::error!(
                        program_id = %key.program_id,
                        cycle_id = %key.cycle_id,
                        reason = %failure,
                        "cycle failed"
                    ),
                }
                self.announce(
                    failure.title(),
                    format!("{}: cycle {}: {failure}", program.name, key.cycle_id),
                )
                .await;
            }
        }
        Ok(())
    }
}

/// Variables passed to a cycle action; the action's overrides win
fn action_variables(key: &CycleKey, action: &ActionTemplate, index: usize) -> Variables {
    let mut vars = Variables::new();
    vars.insert("origin".into(), "program".into());
    vars.insert("program_id".into(), key.program_id.as_str().into());
    vars.insert("cycle_id".into(), key.cycle_id.as_str().into());
    vars.insert("action".into(), action.name.as_str().into());
    vars.insert("action_index".into(), index.into());
    for (name, value) in &action.overrides {
        vars.insert(name.clone(), value.clone());
    }
    vars
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
