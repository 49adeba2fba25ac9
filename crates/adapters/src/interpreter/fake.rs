// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake flow interpreter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExecutionNotice, FlowError, FlowInterpreter, NoticeBus};
use async_trait::async_trait;
use sprig_core::{CancellationToken, FlowDefinition, Variables};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

const POLL: Duration = Duration::from_millis(100);

/// Scripted behavior for one execution of a flow
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return `Ok(true)` immediately
    Succeed,
    /// Return `Ok(false)`
    ReportFailure,
    /// Return the given error
    Fail(FlowError),
    /// Run for a while, honoring cancellation, then succeed
    RunFor(Duration),
    /// Run until cancelled
    UntilCancelled,
    /// Run for a while without ever checking for cancellation
    IgnoreCancel(Duration),
}

/// Recorded execution
#[derive(Debug, Clone)]
pub struct InterpreterCall {
    pub flow_id: String,
    pub variables: Variables,
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<InterpreterCall>,
    finished: Vec<String>,
    running: usize,
    max_running: usize,
    silent: bool,
}

/// Fake interpreter with per-flow scripted outcomes
///
/// Flows without a script succeed. Tracks the peak number of concurrent executions
/// so tests can assert the hardware was never shared.
#[derive(Clone, Default)]
pub struct FakeFlowInterpreter {
    state: Arc<Mutex<FakeState>>,
    bus: NoticeBus,
}

impl FakeFlowInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a behavior for the next execution of `flow_id`
    pub fn script(&self, flow_id: &str, behavior: Scripted) {
        self.lock()
            .scripts
            .entry(flow_id.to_string())
            .or_default()
            .push_back(behavior);
    }

    /// Never publish settle notices, so waits fall back to their timeout
    pub fn silence_notices(&self) {
        self.lock().silent = true;
    }

    /// All executions started, in order
    pub fn calls(&self) -> Vec<InterpreterCall> {
        self.lock().calls.clone()
    }

    /// Flow ids of executions that returned, in order
    pub fn finished(&self) -> Vec<String> {
        self.lock().finished.clone()
    }

    /// Peak number of executions in flight at once
    pub fn max_concurrent(&self) -> usize {
        self.lock().max_running
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn perform(
        &self,
        behavior: Scripted,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError> {
        let cancelled = |reason: String| FlowError::Cancelled { reason };
        match behavior {
            Scripted::Succeed => Ok(true),
            Scripted::ReportFailure => Ok(false),
            Scripted::Fail(err) => Err(err),
            Scripted::RunFor(duration) => {
                let deadline = tokio::time::Instant::now() + duration;
                while tokio::time::Instant::now() < deadline {
                    cancel.checkpoint().map_err(cancelled)?;
                    let left = deadline.saturating_duration_since(tokio::time::Instant::now());
                    tokio::time::sleep(POLL.min(left)).await;
                }
                cancel.checkpoint().map_err(cancelled)?;
                Ok(true)
            }
            Scripted::UntilCancelled => loop {
                cancel.checkpoint().map_err(cancelled)?;
                tokio::time::sleep(POLL).await;
            },
            Scripted::IgnoreCancel(duration) => {
                tokio::time::sleep(duration).await;
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl FlowInterpreter for FakeFlowInterpreter {
    async fn execute(
        &self,
        flow: &FlowDefinition,
        variables: &Variables,
        cancel: &CancellationToken,
    ) -> Result<bool, FlowError> {
        let behavior = {
            let mut state = self.lock();
            state.calls.push(InterpreterCall {
                flow_id: flow.id.clone(),
                variables: variables.clone(),
            });
            state.running += 1;
            state.max_running = state.max_running.max(state.running);
            state
                .scripts
                .get_mut(&flow.id)
                .and_then(|q| q.pop_front())
                .unwrap_or(Scripted::Succeed)
        };

        let result = self.perform(behavior, cancel).await;

        let silent = {
            let mut state = self.lock();
            state.running -= 1;
            state.finished.push(flow.id.clone());
            state.silent
        };
        if !silent {
            match result {
                Ok(true) => self.bus.publish_settled(&flow.id),
                _ => self.bus.publish(ExecutionNotice::StatusChanged { idle: true }),
            }
        }
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<ExecutionNotice> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
