// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scheduler fixture for tests

use crate::config::SchedulerConfig;
use crate::scheduler::{Scheduler, SchedulerDeps};
use crate::tick::TickReport;
use chrono::{DateTime, Utc};
use sprig_adapters::{FakeCatalog, FakeFlowInterpreter, FakeNotifyAdapter};
use sprig_core::{
    ActiveProgram, Clock, CycleId, DailyTracking, ExecutionSession, FakeClock, MonitorId,
    MonitoringFlow, ProgramId, QueueEntry, SequentialIdGen, SessionKind,
};
use sprig_storage::{MonitorStore, ProgramStore, QueueStore, Store};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) type TestScheduler = Scheduler<
    Store,
    FakeFlowInterpreter,
    FakeNotifyAdapter,
    FakeCatalog,
    FakeClock,
    SequentialIdGen,
>;

/// Fixed test day, clear of DST transitions
const DAY: (i32, u32, u32) = (2026, 6, 10);

pub(crate) fn local(hour: u32, minute: u32) -> DateTime<Utc> {
    FakeClock::at_local(DAY.0, DAY.1, DAY.2, hour, minute).now()
}

pub(crate) struct Harness {
    pub scheduler: Arc<TestScheduler>,
    pub store: Arc<Store>,
    pub interpreter: FakeFlowInterpreter,
    pub notify: FakeNotifyAdapter,
    pub clock: FakeClock,
    pub dir: TempDir,
}

impl Harness {
    /// A synced scheduler on a fresh store, with the clock at `hour:minute`
    pub fn at(catalog: FakeCatalog, hour: u32, minute: u32) -> Self {
        Self::with_config(catalog, hour, minute, SchedulerConfig::default())
    }

    pub fn with_config(
        catalog: FakeCatalog,
        hour: u32,
        minute: u32,
        config: SchedulerConfig,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("wal.jsonl")).unwrap());
        let clock = FakeClock::at(local(hour, minute));
        Self::build(dir, store, catalog, clock, config)
    }

    /// A new scheduler over the same store directory, as after a restart
    pub fn restart(self, catalog: FakeCatalog) -> Self {
        let Harness {
            dir,
            store,
            clock,
            scheduler,
            ..
        } = self;
        let config = scheduler.config().clone();
        drop(scheduler);
        drop(store);
        let store = Arc::new(Store::open(&dir.path().join("wal.jsonl")).unwrap());
        Self::build(dir, store, catalog, clock, config)
    }

    fn build(
        dir: TempDir,
        store: Arc<Store>,
        catalog: FakeCatalog,
        clock: FakeClock,
        config: SchedulerConfig,
    ) -> Self {
        let interpreter = FakeFlowInterpreter::new();
        let notify = FakeNotifyAdapter::new();
        let scheduler = Scheduler::new(
            SchedulerDeps {
                store: Arc::clone(&store),
                interpreter: interpreter.clone(),
                notify: notify.clone(),
                catalog,
            },
            clock.clone(),
            SequentialIdGen::new("id"),
            config,
        );
        scheduler.sync_catalog().unwrap();
        Self {
            scheduler,
            store,
            interpreter,
            notify,
            clock,
            dir,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn set_time(&self, hour: u32, minute: u32) {
        self.clock.set(local(hour, minute));
    }

    pub async fn tick(&self) -> TickReport {
        self.scheduler.tick().await.unwrap()
    }

    pub fn program(&self, id: &str) -> ActiveProgram {
        self.store.program(&ProgramId::from(id)).unwrap()
    }

    pub fn cycle_count(&self, program: &str, cycle: &str) -> u64 {
        self.program(program)
            .cycle(&CycleId::from(cycle))
            .unwrap()
            .execution_count
    }

    pub fn monitor(&self, id: &str) -> MonitoringFlow {
        self.store.monitor(&MonitorId::from(id)).unwrap()
    }

    pub fn sessions(&self, kind: SessionKind) -> Vec<ExecutionSession> {
        let mut sessions: Vec<_> = self
            .store
            .snapshot()
            .sessions
            .into_values()
            .filter(|s| s.kind == kind)
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    pub fn daily(&self) -> DailyTracking {
        self.store.daily()
    }

    /// Queue entries in drain order
    pub fn queue(&self) -> Vec<QueueEntry> {
        self.store.entries()
    }

    /// Flow ids passed to the interpreter, in call order
    pub fn executed(&self) -> Vec<String> {
        self.interpreter
            .calls()
            .into_iter()
            .map(|c| c.flow_id)
            .collect()
    }
}
