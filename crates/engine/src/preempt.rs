// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preemption of monitoring flows by program cycles
//!
//! A starting cycle first waits for the active monitoring flow to finish on its own.
//! Past the preempt timeout the flow is cancelled; if it still has not stopped after
//! the graceful period its session is failed outright, so the cycle's wait is bounded
//! by `preempt_timeout + graceful_stop`.

use crate::error::EngineError;
use crate::scheduler::Scheduler;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{Clock, ExecutionSession, IdGen, MonitorId, PausedBy, SessionId};
use sprig_storage::SchedulerStore;
use std::time::Duration;

/// Recorded on a monitoring session ended to make way for a cycle
pub const PREEMPTED_REASON: &str = "preempted by higher-priority cycle";

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    /// Wait for `active` to end, preempting it if it runs past the timeout
    pub(crate) async fn wait_or_preempt(
        &self,
        active: &ExecutionSession,
        program_name: &str,
    ) -> Result<(), EngineError> {
        tracing::info!(
            session_id = %active.id,
            flow_id = %active.source_id,
            program = program_name,
            "cycle waiting for monitoring flow"
        );
        if self
            .wait_inactive(&active.id, self.config.preempt_timeout, self.config.preempt_poll)
            .await
        {
            return Ok(());
        }

        match self.running.monitor_token(&active.id) {
            Some(token) => token.cancel(PREEMPTED_REASON),
            None => tracing::warn!(session_id = %active.id, "no cancellation handle for monitoring session"),
        }
        tracing::warn!(session_id = %active.id, flow_id = %active.source_id, program = program_name, "preempting monitoring flow");

        if !self
            .wait_inactive(&active.id, self.config.graceful_stop, self.config.graceful_poll)
            .await
        {
            tracing::warn!(session_id = %active.id, "monitoring flow ignored cancellation, failing its session");
            self.store
                .fail_session(&active.id, PREEMPTED_REASON, self.clock.now())?;
        }

        let flow_id = MonitorId::from(active.source_id.as_str());
        if let Some(flow) = self.store.monitor(&flow_id) {
            self.defer(&flow, PausedBy::TimeoutInterrupt)?;
        }
        self.announce(
            "Monitoring preempted",
            format!("{} interrupted for {program_name}", active.source_name),
        )
        .await;
        Ok(())
    }

    /// Poll until the session is no longer active; `false` on timeout
    async fn wait_inactive(&self, id: &SessionId, timeout: Duration, poll: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.store.session(id).is_some_and(|s| s.is_active()) {
                return true;
            }
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            if left.is_zero() {
                return false;
            }
            tokio::time::sleep(poll.min(left)).await;
        }
    }
}

#[cfg(test)]
#[path = "preempt_tests.rs"]
mod tests;
