// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time status reports

use crate::scheduler::Scheduler;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{
    ActiveProgram, Clock, CycleId, DailyTracking, EntryStatus, ExecutionSession, IdGen,
    MonitorId, MonitoringFlow, ProgramId, QueueEntry,
};
use sprig_storage::SchedulerStore;

#[derive(Debug, Clone, Serialize)]
pub struct RunningCycleStatus {
    pub program_id: ProgramId,
    pub cycle_id: CycleId,
    pub started_at: Option<DateTime<Utc>>,
    /// When the cycle exceeds its budget
    pub max_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunningMonitorStatus {
    pub flow_id: MonitorId,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueSummary {
    pub pending: usize,
    pub executing: usize,
    pub failed: usize,
    pub entries: Vec<QueueEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub hardware_busy: bool,
    pub active_session: Option<ExecutionSession>,
    pub running_cycles: Vec<RunningCycleStatus>,
    pub running_monitors: Vec<RunningMonitorStatus>,
    pub programs: Vec<ActiveProgram>,
    pub monitors: Vec<MonitoringFlow>,
    pub queue: QueueSummary,
    pub daily: DailyTracking,
}

impl StatusReport {
    /// Status as recorded in the store alone
    ///
    /// Used when no scheduler is running in this process: running cycles come from
    /// the persisted executing flags.
    pub fn from_store<S: SchedulerStore>(store: &S, now: DateTime<Utc>) -> Self {
        let programs = store.programs();
        let running_cycles = programs
            .iter()
            .flat_map(|p| {
                p.cycles
                    .iter()
                    .filter(|c| c.is_currently_executing)
                    .map(|c| RunningCycleStatus {
                        program_id: p.id.clone(),
                        cycle_id: c.cycle_id.clone(),
                        started_at: c.last_executed,
                        max_end: c.last_executed.and_then(|at| {
                            let budget = TimeDelta::from_std(p.max_execution_time?).ok()?;
                            Some(at + budget)
                        }),
                    })
            })
            .collect();
        let active_session = store.active_session();
        Self {
            generated_at: now,
            hardware_busy: active_session.is_some(),
            active_session,
            running_cycles,
            running_monitors: Vec::new(),
            programs,
            monitors: store.monitors(),
            queue: QueueSummary::new(store.entries()),
            daily: store.daily(),
        }
    }
}

impl QueueSummary {
    fn new(entries: Vec<QueueEntry>) -> Self {
        let count = |status| entries.iter().filter(|e| e.status == status).count();
        Self {
            pending: count(EntryStatus::Pending),
            executing: count(EntryStatus::Executing),
            failed: count(EntryStatus::Failed),
            entries,
        }
    }
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
    /// Live status, including executions claimed by this process
    pub fn status(&self) -> StatusReport {
        let mut report = StatusReport::from_store(self.store.as_ref(), self.clock.now());
        report.hardware_busy = self.hardware_busy();
        report.running_cycles = self
            .running
            .cycles()
            .into_iter()
            .map(|(key, cycle)| RunningCycleStatus {
                program_id: key.program_id,
                cycle_id: key.cycle_id,
                started_at: Some(cycle.started_at),
                max_end: TimeDelta::from_std(cycle.max_execution)
                    .ok()
                    .map(|budget| cycle.started_at + budget),
            })
            .collect();
        report.running_monitors = self
            .running
            .monitors()
            .into_iter()
            .map(|(flow_id, monitor)| RunningMonitorStatus {
                flow_id,
                started_at: monitor.started_at,
            })
            .collect();
        report
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
