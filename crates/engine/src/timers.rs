// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler's timers: the tick and the local-midnight reset

use crate::scheduler::Scheduler;
use chrono::Timelike;
use sprig_adapters::{FlowCatalog, FlowInterpreter, NotifyAdapter};
use sprig_core::{next_local_midnight, Clock, IdGen};
use sprig_storage::SchedulerStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

impl<S, I, N, C, K, G> Scheduler<S, I, N, C, K, G>
where
    S: SchedulerStore,
    I: FlowInterpreter,
    N: NotifyAdapter,
    C: FlowCatalog,
    K: Clock,
    G: IdGen,
{
    /// Drive ticks and daily resets until the returned future is dropped
    ///
    /// The first tick runs immediately; later ticks are aligned to the start of a
    /// wall-clock minute. Each tick runs as its own task so a long monitoring flow
    /// never delays the next minute's cycles.
    pub async fn run_timers(self: Arc<Self>) {
        self.spawn_tick();

        let into_minute = Duration::from_secs(u64::from(self.clock.now().second()));
        let first = Instant::now() + Duration::from_secs(60).saturating_sub(into_minute);
        let mut ticker = tokio::time::interval_at(first, self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let now = self.clock.now();
            let until_midnight = (next_local_midnight(now) - now)
                .to_std()
                .unwrap_or(Duration::from_secs(1));
            tokio::select! {
                _ = ticker.tick() => self.spawn_tick(),
                _ = tokio::time::sleep(until_midnight) => {
                    if let Err(e) = self.reset_daily_tracking() {
                        tracing::error!(error = %e, "daily reset failed");
                    }
                }
            }
        }
    }

    fn spawn_tick(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Err(e) = scheduler.tick().await {
                tracing::error!(error = %e, "tick failed");
            }
        });
        self.track(handle);
    }
}
