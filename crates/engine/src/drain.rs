// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Draining the monitoring queue
//!
//! Only one drain runs at a time. A drain requested while one is running is folded
//! into another pass of the running drain.

use crate::error::EngineError;
use crate::monitor::MonitorOutcome;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{Clock, IdGen};
use sprig_storage::SchedulerStore;
use std::sync::atomic::Ordering;

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    /// Execute pending queue entries in order while the hardware is idle
    pub async fn drain(&self) {
        if self.draining.swap(true, Ordering::SeqCst) {
            self.drain_requested.store(true, Ordering::SeqCst);
            return;
        }
        loop {
            self.drain_requested.store(false, Ordering::SeqCst);
            if let Err(e) = self.drain_pass().await {
                tracing::error!(error = %e, "queue drain failed");
            }
            self.draining.store(false, Ordering::SeqCst);
            if !self.drain_requested.load(Ordering::SeqCst)
                || self.draining.swap(true, Ordering::SeqCst)
            {
                return;
            }
        }
    }

    async fn drain_pass(&self) -> Result<(), EngineError> {
        loop {
            if self.hardware_busy() {
                tracing::debug!("hardware busy, queue drain paused");
                return Ok(());
            }
            let Some(entry) = self.store.claim_next_pending()? else {
                return Ok(());
            };
            let flow = self.store.monitor(&entry.flow_id).filter(|f| f.is_active);
            let Some(flow) = flow else {
                tracing::info!(entry_id = %entry.id, flow_id = %entry.flow_id, "dropping queue entry for missing or inactive flow");
                self.store.delete_entry(&entry.id)?;
                continue;
            };

            tracing::info!(entry_id = %entry.id, flow_id = %flow.id, paused_by = %entry.paused_by, "running queued monitoring flow");
            match self.execute_monitoring(&flow).await {
                Ok(MonitorOutcome::Completed) => self.store.delete_entry(&entry.id)?,
                Ok(MonitorOutcome::Failed(error)) => self.store.fail_entry(&entry.id, &error)?,
                Ok(MonitorOutcome::Deferred(_)) | Ok(MonitorOutcome::Skipped) => {
                    self.store.requeue_entry(&entry.id)?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(entry_id = %entry.id, error = %e, "queued monitoring flow errored");
                    self.store.fail_entry(&entry.id, &e.to_string())?;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
