// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{local_date, Clock, IdGen};
use sprig_storage::SchedulerStore;

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    /// Start a fresh day of cycle tracking
    pub fn reset_daily_tracking(&self) -> Result<(), EngineError> {
        let previous = self.store.daily();
        let date = local_date(self.clock.now());
        self.store.reset_daily(date)?;
        tracing::info!(
            %date,
            completed_yesterday = previous.completed_cycles.len(),
            "daily tracking reset"
        );
        Ok(())
    }
}
