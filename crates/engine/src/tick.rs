// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling tick
//!
//! Each tick starts the cycles whose `HH:MM` start time matches the current local
//! minute, processes due monitoring flows, drains the queue if the hardware is idle,
//! and reports cycles that have outlived their program's budget.

use crate::error::EngineError;
use crate::monitor::MonitorOutcome;
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{local_hhmm, ActiveProgram, Clock, CycleKey, IdGen, MonitorId};
use sprig_storage::SchedulerStore;
use std::sync::Arc;

/// What a tick did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub cycles_started: Vec<CycleKey>,
    pub monitors: Vec<(MonitorId, MonitorOutcome)>,
    /// Cycles running past their maximum execution time
    pub overruns: Vec<CycleKey>,
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
    /// Run one scheduling pass
    ///
    /// The first tick of a process performs startup recovery before anything else.
    /// Cycles are spawned; monitoring flows are processed in place.
    pub async fn tick(self: &Arc<Self>) -> Result<TickReport, EngineError> {
        self.recovered.get_or_try_init(|| self.recover()).await?;

        let now = self.clock.now();
        let hhmm = local_hhmm(now);
        tracing::debug!(%hhmm, "tick");

        let mut report = TickReport::default();
        for program in self.store.programs() {
            report
                .cycles_started
                .extend(self.start_due_cycles(&program, &hhmm, now));
        }

        let due: Vec<_> = self
            .store
            .monitors()
            .into_iter()
            .filter(|f| f.is_active && f.is_due(now))
            .collect();
        for flow in due {
            match self.process_monitoring_flow(&flow).await {
                Ok(outcome) => report.monitors.push((flow.id.clone(), outcome)),
                Err(e) => {
                    tracing::error!(flow_id = %flow.id, error = %e, "monitoring flow processing failed")
                }
            }
        }

        if !self.hardware_busy() && !self.running.has_monitors() {
            self.drain().await;
        }

        report.overruns = self.overruns(now);
        Ok(report)
    }

    /// Equivalent to a tick, for operator-triggered checks
    pub async fn trigger_manual_check(self: &Arc<Self>) -> Result<TickReport, EngineError> {
        tracing::info!("manual schedule check");
        self.tick().await
    }

    fn start_due_cycles(
        self: &Arc<Self>,
        program: &ActiveProgram,
        hhmm: &str,
        now: DateTime<Utc>,
    ) -> Vec<CycleKey> {
        if !program.is_running() {
            return Vec::new();
        }
        for cycle in &program.cycles {
            if cycle.is_active
                && cycle.start_time == hhmm
                && program.is_cycle_skipped(&cycle.cycle_id, now)
            {
                tracing::info!(program_id = %program.id, cycle_id = %cycle.cycle_id, "cycle skipped for today");
            }
        }

        let mut started = Vec::new();
        for cycle in program.due_cycles(hhmm, now) {
            let key = CycleKey::new(program.id.clone(), cycle.cycle_id.clone());
            if program.has_executing_cycle() {
                tracing::warn!(program_id = %program.id, cycle_id = %cycle.cycle_id, "program already has an executing cycle, not starting");
                continue;
            }
            let max = program.max_execution(self.config.default_max_execution);
            let Some(token) = self.running.claim_cycle(&key, now, max) else {
                tracing::warn!(program_id = %program.id, cycle_id = %cycle.cycle_id, "program already has a claimed cycle, not starting");
                continue;
            };
            tracing::info!(program_id = %program.id, cycle_id = %cycle.cycle_id, "cycle due");
            let handle = tokio::spawn(Arc::clone(self).run_cycle(key.clone(), token));
            self.track(handle);
            started.push(key);
        }
        started
    }

    /// Cycles past their budget; logged only, never cancelled
    fn overruns(&self, now: DateTime<Utc>) -> Vec<CycleKey> {
        let mut overruns = Vec::new();
        for (key, cycle) in self.running.cycles() {
            let elapsed = (now - cycle.started_at).to_std().unwrap_or_default();
            if elapsed > cycle.max_execution {
                tracing::warn!(
                    program_id = %key.program_id,
                    cycle_id = %key.cycle_id,
                    elapsed_secs = elapsed.as_secs(),
                    max_secs = cycle.max_execution.as_secs(),
                    "cycle exceeded its maximum execution time"
                );
                overruns.push(key);
            }
        }
        overruns
    }
}

#[cfg(test)]
#[path = "tick_tests.rs"]
mod tests;
