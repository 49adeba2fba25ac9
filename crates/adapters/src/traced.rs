// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::interpreter::{ExecutionNotice, FlowError, FlowInterpreter};
use crate::notify::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use sprig_core::{CancellationToken, FlowDefinition, Variables};
use tokio::sync::broadcast;

/// Wrapper that adds tracing to any FlowInterpreter
#[derive(Clone)]
pub struct TracedInterpreter<I> {
    inner: I,
}

impl<I> TracedInterpreter<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<I: FlowInterpreter> FlowInterpreter for TracedInterpreter<I> {
    async fn execute(
        &self,
        flow: &FlowDefinition,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError> {
        let span = tracing::info_span!("flow.execute", flow_id = %flow.id);
        let _guard = span.enter();

        let origin = variables
            .get("origin")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        tracing::info!(
            flow_name = %flow.name,
            blocks = flow.blocks.len(),
            origin,
            "starting"
        );

        let start = std::time::Instant::now();
        let result = self.inner.execute(flow, variables, cancel).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(true) => tracing::info!(elapsed_ms, "flow succeeded"),
            Ok(false) => tracing::warn!(elapsed_ms, "flow reported failure"),
            Err(FlowError::Cancelled { reason }) => {
                tracing::info!(elapsed_ms, reason = %reason, "flow cancelled")
            }
            Err(FlowError::SystemNotIdle) => {
                tracing::info!(elapsed_ms, "system busy, flow not started")
            }
            Err(e) => tracing::error!(elapsed_ms, error = %e, "flow failed"),
        }

        result
    }

    fn subscribe(&self) -> broadcast::Receiver<ExecutionNotice> {
        self.inner.subscribe()
    }
}

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn send(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.send", title);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.send(title, message).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => tracing::debug!(elapsed_ms, "sent"),
            // Delivery is best effort
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "send failed"),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
