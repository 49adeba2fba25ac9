// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow interpreter adapters
//!
//! The interpreter executes a flow graph against the hardware. Besides the return value
//! it publishes [`ExecutionNotice`]s: the scheduler treats a flow as settled only once
//! the end-of-flow acknowledgement and the return to idle have both been observed.

mod dry_run;

pub use dry_run::DryRunInterpreter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFlowInterpreter, InterpreterCall, Scripted};

use async_trait::async_trait;
use sprig_core::{CancellationToken, FlowDefinition, Variables};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from flow execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Hardware preconditions failed; the flow never touched the devices
    #[error("hardware validation failed: {}", failures.join("; "))]
    HardwareValidation { failures: Vec<String> },
    #[error("system not in idle state")]
    SystemNotIdle,
    #[error("cancelled: {reason}")]
    Cancelled { reason: String },
    #[error("flow failed: {0}")]
    Failed(String),
}

/// Execution notifications published by an interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionNotice {
    /// The flow's end block ran; `success` is the hardware acknowledgement
    EndBlockExecuted { flow_id: String, success: bool },
    FlowCompleted { flow_id: String },
    StatusChanged { idle: bool },
}

/// Broadcast channel for [`ExecutionNotice`]s, for interpreter implementations
#[derive(Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<ExecutionNotice>,
}

impl NoticeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Having none is fine.
    pub fn publish(&self, notice: ExecutionNotice) {
        let _ = self.tx.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionNotice> {
        self.tx.subscribe()
    }

    /// The notices that mark a successful flow as settled
    pub fn publish_settled(&self, flow_id: &str) {
        self.publish(ExecutionNotice::EndBlockExecuted {
            flow_id: flow_id.to_string(),
            success: true,
        });
        self.publish(ExecutionNotice::FlowCompleted {
            flow_id: flow_id.to_string(),
        });
        self.publish(ExecutionNotice::StatusChanged { idle: true });
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Adapter for executing flow graphs
#[async_trait]
pub trait FlowInterpreter: Clone + Send + Sync + 'static {
    /// Execute `flow`, polling `cancel` at every checkpoint
    ///
    /// `Ok(false)` means the flow ran but reported failure.
    async fn execute(
        &self,
        flow: &FlowDefinition,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError>;

    /// Subscribe to execution notices. Subscribe before `execute` to see all of them.
    fn subscribe(&self) -> broadcast::Receiver<ExecutionNotice>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
