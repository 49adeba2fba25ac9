// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciling stored programs and monitoring flows with the catalog

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{Clock, IdGen, ProgramStatus};
use sprig_storage::SchedulerStore;

/// Counts of changes made by a catalog sync
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub programs_upserted: usize,
    pub programs_removed: usize,
    pub monitors_upserted: usize,
    pub monitors_removed: usize,
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
    /// Make the store match the catalog
    ///
    /// Runtime history (counters, last runs, skips, operator pauses) survives a
    /// re-sync. Entries no longer in the catalog are removed unless they are
    /// executing right now.
    pub fn sync_catalog(&self) -> Result<SyncReport, EngineError> {
        let now = self.clock.now();
        let catalog = self.catalog.catalog();
        let mut report = SyncReport::default();

        for def in &catalog.programs {
            let mut program = def.activate(now);
            if let Some(existing) = self.store.program(&program.id) {
                program.carry_state_from(&existing);
                if !def.active {
                    program.status = ProgramStatus::Stopped;
                } else if existing.status == ProgramStatus::Stopped {
                    program.status = ProgramStatus::Running;
                }
                if program == existing {
                    continue;
                }
            }
            self.store.upsert_program(program)?;
            report.programs_upserted += 1;
        }
        for program in self.store.programs() {
            if catalog.program(&program.definition_id).is_some() {
                continue;
            }
            if program.has_executing_cycle() {
                tracing::warn!(program_id = %program.id, "program left the catalog while executing, keeping it");
                continue;
            }
            self.store.remove_program(&program.id)?;
            report.programs_removed += 1;
        }

        for def in &catalog.monitors {
            let mut flow = def.to_flow(now);
            if let Some(existing) = self.store.monitor(&flow.id) {
                flow.carry_state_from(&existing);
                if flow == existing {
                    continue;
                }
            }
            self.store.upsert_monitor(flow)?;
            report.monitors_upserted += 1;
        }
        for flow in self.store.monitors() {
            if catalog.monitors.iter().any(|m| m.id == flow.id.as_str()) {
                continue;
            }
            if self.running.is_monitor_running(&flow.id) {
                continue;
            }
            self.store.remove_monitor(&flow.id)?;
            report.monitors_removed += 1;
        }

        tracing::info!(
            programs_upserted = report.programs_upserted,
            programs_removed = report.programs_removed,
            monitors_upserted = report.monitors_upserted,
            monitors_removed = report.monitors_removed,
            "catalog synced"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
