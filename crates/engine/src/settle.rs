// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Waiting for the interpreter to settle after an action
//!
//! The interpreter may return before the hardware is back to idle. The next action
//! starts only once the flow has reported its end and the interpreter reports idle,
//! or the settle timeout elapses.

use crate::scheduler::Scheduler;
use sprig_adapters::{ExecutionNotice, FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{Clock, IdGen};
use sprig_storage::SchedulerStore;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Settled {
    Settled,
    ChannelClosed,
    TimedOut,
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
    pub(crate) async fn wait_settled(
        &self,
        notices: broadcast::Receiver<ExecutionNotice>,
        flow_id: &str,
    ) -> Settled {
        let outcome = match tokio::time::timeout(
            self.config.settle_timeout,
            settle(notices, flow_id),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Settled::TimedOut,
        };
        match outcome {
            Settled::Settled => tracing::debug!(flow_id, "flow settled"),
            Settled::ChannelClosed => {
                tracing::warn!(flow_id, "interpreter notices closed before flow settled")
            }
            Settled::TimedOut => tracing::warn!(
                flow_id,
                timeout_secs = self.config.settle_timeout.as_secs(),
                "flow did not settle in time, continuing"
            ),
        }
        outcome
    }
}

async fn settle(mut notices: broadcast::Receiver<ExecutionNotice>, flow_id: &str) -> Settled {
    let mut ended = false;
    let mut idle = false;
    loop {
        match notices.recv().await {
            Ok(ExecutionNotice::EndBlockExecuted { flow_id: id, success }) if id == flow_id => {
                ended |= success;
            }
            Ok(ExecutionNotice::FlowCompleted { flow_id: id }) if id == flow_id => ended = true,
            Ok(ExecutionNotice::StatusChanged { idle: now_idle }) => idle = now_idle,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(flow_id, skipped, "missed interpreter notices");
            }
            Err(RecvError::Closed) => return Settled::ChannelClosed,
        }
        if ended && idle {
            return Settled::Settled;
        }
    }
}

#[cfg(test)]
#[path = "settle_tests.rs"]
mod tests;
