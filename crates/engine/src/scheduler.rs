// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler: shared state and operator controls
//!
//! Behaviour is split across sibling modules, each adding an `impl` block:
//! `tick` (minute scheduling), `cycle` (program cycles), `monitor` (monitoring flows),
//! `preempt`, `drain` (the monitoring queue), `recovery`, `daily` and `timers`.

use crate::config::SchedulerConfig;
use crate::error::EngineError;
use crate::guards::RunningSet;
use chrono::{DateTime, Utc};
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{
    Clock, CycleId, EntryId, IdGen, MonitoringFlow, PausedBy, ProgramId, ProgramStatus,
    SkippedCycle,
};
use sprig_storage::{Deferral, SchedulerStore};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

/// Cancellation reason for operator stops
pub const STOPPED_REASON: &str = "stopped by operator";

/// Cancellation reason at shutdown
pub const SHUTDOWN_REASON: &str = "scheduler shutting down";

/// External collaborators of the scheduler
pub struct SchedulerDeps<S, I, N, C> {
    pub store: Arc<S>,
    pub interpreter: I,
    pub notify: N,
    pub catalog: C,
}

/// Runs program cycles and monitoring flows against a single set of hardware
///
/// At most one execution session is active at a time. Program cycles take
/// precedence: monitoring flows that cannot run are deferred to a durable queue
/// and drained whenever the hardware goes idle.
pub struct Scheduler<S, I, N, C, K, G> {
    pub(crate) store: Arc<S>,
    pub(crate) interpreter: I,
    pub(crate) notify: N,
    pub(crate) catalog: C,
    pub(crate) clock: K,
    pub(crate) ids: G,
    pub(crate) config: SchedulerConfig,
    pub(crate) running: RunningSet,
    /// Serializes cycle runs across programs
    pub(crate) cycle_lane: tokio::sync::Mutex<()>,
    pub(crate) draining: AtomicBool,
    pub(crate) drain_requested: AtomicBool,
    pub(crate) recovered: OnceCell<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
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
    pub fn new(
        deps: SchedulerDeps<S, I, N, C>,
        clock: K,
        ids: G,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: deps.store,
            interpreter: deps.interpreter,
            notify: deps.notify,
            catalog: deps.catalog,
            clock,
            ids,
            config,
            running: RunningSet::default(),
            cycle_lane: tokio::sync::Mutex::new(()),
            draining: AtomicBool::new(false),
            drain_requested: AtomicBool::new(false),
            recovered: OnceCell::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether any execution holds, or is about to take, the hardware
    pub fn hardware_busy(&self) -> bool {
        self.running.has_cycles() || self.store.active_session().is_some()
    }

    /// Cancel the running cycles of a program
    ///
    /// The program keeps its status and stays scheduled. Returns how many cycles
    /// were signalled.
    pub fn stop_program(&self, program_id: &ProgramId) -> usize {
        let cancelled = self.running.cancel_program(program_id, STOPPED_REASON);
        tracing::info!(program_id = %program_id, cancelled, "program stop requested");
        cancelled
    }

    pub fn pause_program(&self, program_id: &ProgramId) -> Result<(), EngineError> {
        self.set_status(program_id, ProgramStatus::Paused)
    }

    pub fn resume_program(&self, program_id: &ProgramId) -> Result<(), EngineError> {
        self.set_status(program_id, ProgramStatus::Running)
    }

    fn set_status(&self, program_id: &ProgramId, status: ProgramStatus) -> Result<(), EngineError> {
        if self.store.program(program_id).is_none() {
            return Err(EngineError::ProgramNotFound(program_id.to_string()));
        }
        self.store.set_program_status(program_id, status)?;
        tracing::info!(program_id = %program_id, %status, "program status changed");
        Ok(())
    }

    /// Skip a cycle until the given instant
    pub fn skip_cycle(
        &self,
        program_id: &ProgramId,
        cycle_id: &CycleId,
        until: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), EngineError> {
        let program = self
            .store
            .program(program_id)
            .ok_or_else(|| EngineError::ProgramNotFound(program_id.to_string()))?;
        if program.cycle(cycle_id).is_none() {
            return Err(EngineError::CycleNotFound {
                program: program_id.to_string(),
                cycle: cycle_id.to_string(),
            });
        }
        self.store.skip_cycle(
            program_id,
            SkippedCycle {
                cycle_id: cycle_id.clone(),
                skip_until: until,
                reason,
            },
        )?;
        tracing::info!(program_id = %program_id, cycle_id = %cycle_id, %until, "cycle skipped");
        Ok(())
    }

    /// Cancel everything in flight and wait up to `grace` for it to unwind
    pub async fn shutdown(&self, grace: Duration) {
        let cancelled = self.running.cancel_all(SHUTDOWN_REASON);
        tracing::info!(cancelled, "scheduler shutting down");
        if tokio::time::timeout(grace, self.wait_idle()).await.is_err() {
            tracing::warn!("executions still running after shutdown grace period");
        }
    }

    /// Wait for every spawned cycle and tick to finish
    pub async fn wait_idle(&self) {
        loop {
            let handles = {
                let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *tasks)
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "scheduler task panicked");
                }
            }
        }
    }

    pub(crate) fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    /// Push a monitoring flow to the queue, or re-tag its open entry
    pub(crate) fn defer(
        &self,
        flow: &MonitoringFlow,
        paused_by: PausedBy,
    ) -> Result<Deferral, EngineError> {
        let deferral = self.store.defer(
            flow,
            paused_by,
            EntryId::from(self.ids.next()),
            self.clock.now(),
            self.config.queue_retention,
        )?;
        tracing::info!(
            flow_id = %flow.id,
            entry_id = %deferral.entry_id(),
            %paused_by,
            requeued = matches!(deferral, Deferral::Retagged(_)),
            "monitoring flow deferred"
        );
        Ok(deferral)
    }

    /// Send an operator notification; failures are logged and otherwise ignored
    pub(crate) async fn announce(&self, title: &str, message: String) {
        if let Err(e) = self.notify.send(title, &message).await {
            tracing::warn!(title, error = %e, "notification failed");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
