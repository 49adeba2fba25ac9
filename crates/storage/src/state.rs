// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use sprig_core::{
    ActiveProgram, DailyTracking, EntryId, EntryStatus, ExecutionSession, MonitorId,
    MonitoringFlow, Operation, ProgramId, QueueEntry, SessionId,
};
use std::collections::BTreeMap;

/// Materialized state built from WAL operations
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub programs: BTreeMap<ProgramId, ActiveProgram>,
    pub sessions: BTreeMap<SessionId, ExecutionSession>,
    pub monitors: BTreeMap<MonitorId, MonitoringFlow>,
    pub queue: BTreeMap<EntryId, QueueEntry>,
    pub daily: DailyTracking,
}

impl MaterializedState {
    /// The session currently owning the hardware, if any
    pub fn active_session(&self) -> Option<&ExecutionSession> {
        self.sessions.values().find(|s| s.is_active())
    }

    pub fn active_sessions(&self) -> impl Iterator<Item = &ExecutionSession> {
        self.sessions.values().filter(|s| s.is_active())
    }

    /// The open (pending or executing) entry for a flow
    pub fn open_entry_for(&self, flow_id: &MonitorId) -> Option<&QueueEntry> {
        self.queue
            .values()
            .find(|e| &e.flow_id == flow_id && e.is_open())
    }

    /// Entries with the given status in drain order
    pub fn entries_with(&self, status: EntryStatus) -> Vec<&QueueEntry> {
        let mut entries: Vec<_> = self.queue.values().filter(|e| e.status == status).collect();
        entries.sort_by(|a, b| QueueEntry::drain_order(a, b));
        entries
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::ProgramUpsert { program } => {
                self.programs.insert(program.id.clone(), program.clone());
            }

            Operation::ProgramRemove { id } => {
                self.programs.remove(id);
            }

            Operation::ProgramStatusSet { id, status } => {
                if let Some(program) = self.programs.get_mut(id) {
                    program.status = *status;
                }
            }

            Operation::CycleSkip { program_id, skip } => {
                if let Some(program) = self.programs.get_mut(program_id) {
                    program.skipped_cycles.retain(|s| s.cycle_id != skip.cycle_id);
                    program.skipped_cycles.push(skip.clone());
                }
            }

            Operation::CycleStarted {
                program_id,
                cycle_id,
                at,
            } => {
                if let Some(program) = self.programs.get_mut(program_id) {
                    if let Some(cycle) = program.cycle_mut(cycle_id) {
                        cycle.is_currently_executing = true;
                        cycle.execution_count += 1;
                        cycle.last_executed = Some(*at);
                        program.total_executions += 1;
                    }
                }
            }

            Operation::CycleFinished {
                program_id,
                cycle_id,
            } => {
                if let Some(cycle) = self
                    .programs
                    .get_mut(program_id)
                    .and_then(|p| p.cycle_mut(cycle_id))
                {
                    cycle.is_currently_executing = false;
                }
            }

            Operation::SessionOpen { session } => {
                self.sessions.insert(session.id.clone(), session.clone());
            }

            Operation::SessionRunning { id } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.mark_running();
                }
            }

            Operation::SessionCycleStart { id, cycle_id, at } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.start_cycle(cycle_id.clone(), *at);
                }
            }

            Operation::SessionCycleFinish {
                id,
                cycle_id,
                status,
                at,
            } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.finish_cycle(cycle_id, *status, *at);
                }
            }

            Operation::SessionFlowStart {
                id,
                cycle_id,
                flow_id,
                flow_name,
                at,
            } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.start_flow(cycle_id, flow_id.clone(), flow_name.clone(), *at);
                }
            }

            Operation::SessionFlowFinish {
                id,
                cycle_id,
                flow_id,
                status,
                error,
                at,
            } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.finish_flow(cycle_id, flow_id, *status, error.clone(), *at);
                }
            }

            Operation::SessionComplete { id, at } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.complete(*at);
                }
            }

            Operation::SessionFail { id, reason, at } => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.fail(reason.clone(), *at);
                }
            }

            Operation::MonitorUpsert { flow } => {
                self.monitors.insert(flow.id.clone(), flow.clone());
            }

            Operation::MonitorRemove { id } => {
                self.monitors.remove(id);
            }

            Operation::MonitorExecuted { id, at, error } => {
                if let Some(flow) = self.monitors.get_mut(id) {
                    flow.record_execution(*at, error.clone());
                }
            }

            Operation::QueuePush { entry } => {
                self.queue.insert(entry.id.clone(), entry.clone());
            }

            Operation::QueueRetag { id, paused_by } => {
                if let Some(entry) = self.queue.get_mut(id) {
                    entry.paused_by = *paused_by;
                }
            }

            Operation::QueueExecuting { id } => {
                if let Some(entry) = self.queue.get_mut(id) {
                    entry.status = EntryStatus::Executing;
                    entry.execution_attempts += 1;
                }
            }

            Operation::QueuePending { id } => {
                if let Some(entry) = self.queue.get_mut(id) {
                    entry.status = EntryStatus::Pending;
                }
            }

            Operation::QueueFailed { id, error } => {
                if let Some(entry) = self.queue.get_mut(id) {
                    entry.status = EntryStatus::Failed;
                    entry.last_error = Some(error.clone());
                }
            }

            Operation::QueueDelete { id } => {
                self.queue.remove(id);
            }

            Operation::QueuePrune { flow_id, before } => {
                self.queue.retain(|_, e| {
                    !(&e.flow_id == flow_id && !e.is_open() && e.added_at < *before)
                });
            }

            Operation::DailyReset { date } => {
                self.daily.reset(*date);
            }

            Operation::DailyCycleRecorded { key, succeeded } => {
                self.daily.record_cycle(key.clone(), *succeeded);
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
