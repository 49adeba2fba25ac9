// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery
//!
//! Nothing survives a restart mid-execution. Sessions, executing cycle flags and
//! claimed queue entries left by a previous process are reconciled before the first
//! tick schedules anything.

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{Clock, IdGen};
use sprig_storage::SchedulerStore;

/// Recorded on sessions that were active when the previous process stopped
pub const INTERRUPTED_REASON: &str = "interrupted by restart";

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    pub(crate) async fn recover(&self) -> Result<(), EngineError> {
        let sessions = self
            .store
            .fail_active_sessions(INTERRUPTED_REASON, self.clock.now())?;
        let cycles = self.store.clear_executing_cycles()?;
        let entries = self.store.reset_executing_entries()?;

        if sessions.is_empty() && cycles.is_empty() && entries == 0 {
            tracing::debug!("no interrupted work to recover");
        } else {
            for key in &cycles {
                tracing::warn!(program_id = %key.program_id, cycle_id = %key.cycle_id, "cycle interrupted by restart");
            }
            tracing::warn!(
                sessions = sessions.len(),
                cycles = cycles.len(),
                entries,
                "recovered interrupted work"
            );
        }

        // Sync keeps programs that were executing; with the flags cleared, drop
        // the ones that have since left the catalog
        if !cycles.is_empty() {
            self.sync_catalog()?;
        }

        self.drain().await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
