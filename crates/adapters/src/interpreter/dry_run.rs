// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dry-run interpreter: walks a flow without touching hardware

use super::{ExecutionNotice, FlowError, FlowInterpreter, NoticeBus};
use async_trait::async_trait;
use sprig_core::{CancellationToken, FlowDefinition, Variables};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Interpreter that logs each block instead of driving devices
///
/// Behaves like real hardware where the scheduler can observe it: one flow at a time
/// (a second concurrent call fails with [`FlowError::SystemNotIdle`]), a cancellation
/// checkpoint between blocks, and settle notices after each successful run.
#[derive(Clone)]
pub struct DryRunInterpreter {
    bus: NoticeBus,
    busy: Arc<AtomicBool>,
    block_delay: Duration,
}

impl DryRunInterpreter {
    pub fn new(block_delay: Duration) -> Self {
        Self {
            bus: NoticeBus::default(),
            busy: Arc::new(AtomicBool::new(false)),
            block_delay,
        }
    }

    async fn walk(
        &self,
        flow: &FlowDefinition,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError> {
        tracing::info!(
            flow_id = %flow.id,
            blocks = flow.blocks.len(),
            variables = variables.len(),
            "dry run"
        );
        for block in &flow.blocks {
            cancel
                .checkpoint()
                .map_err(|reason| FlowError::Cancelled { reason })?;
            tracing::info!(flow_id = %flow.id, block_id = %block.id, kind = %block.kind, "block");
            tokio::time::sleep(self.block_delay).await;
        }
        cancel
            .checkpoint()
            .map_err(|reason| FlowError::Cancelled { reason })?;
        Ok(true)
    }
}

impl Default for DryRunInterpreter {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl FlowInterpreter for DryRunInterpreter {
    async fn execute(
        &self,
        flow: &FlowDefinition,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(FlowError::SystemNotIdle);
        }
        self.bus.publish(ExecutionNotice::StatusChanged { idle: false });

        let result = self.walk(flow, variables, cancel).await;

        self.busy.store(false, Ordering::SeqCst);
        match result {
            Ok(true) => self.bus.publish_settled(&flow.id),
            _ => self.bus.publish(ExecutionNotice::StatusChanged { idle: true }),
        }
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<ExecutionNotice> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
#[path = "dry_run_tests.rs"]
mod tests;
