// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: lock, state, catalog sync, shutdown

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use sprig_adapters::{
    DesktopNotifyAdapter, DryRunInterpreter, FileCatalog, FlowCatalogError, NoOpNotifyAdapter,
    NotifyAdapter, NotifyError, TracedInterpreter, TracedNotifyAdapter,
};
use sprig_core::{SystemClock, UuidIdGen};
use sprig_engine::{EngineError, Scheduler, SchedulerDeps, StatusReport};
use sprig_storage::{Store, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, NotifyConfig, Paths};

/// Scheduler with the daemon's concrete adapters (wrapped with tracing)
pub type DaemonScheduler = Scheduler<
    Store,
    TracedInterpreter<DryRunInterpreter>,
    TracedNotifyAdapter<DaemonNotifier>,
    FileCatalog,
    SystemClock,
    UuidIdGen,
>;

/// Notifier chosen by `[notify]`: a command when one is configured, otherwise log only
#[derive(Clone, Debug)]
pub enum DaemonNotifier {
    Command(DesktopNotifyAdapter),
    Logged(NoOpNotifyAdapter),
}

impl DaemonNotifier {
    pub fn from_config(config: &NotifyConfig) -> Self {
        match &config.command {
            Some(command) => Self::Command(DesktopNotifyAdapter::new(command.clone())),
            None => Self::Logged(NoOpNotifyAdapter::new()),
        }
    }
}

#[async_trait]
impl NotifyAdapter for DaemonNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        match self {
            Self::Command(inner) => inner.send(title, message).await,
            Self::Logged(inner) => inner.send(title, message).await,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory (set state_dir or HOME)")]
    NoStateDir,

    #[error("Failed to read config {0}: {1}")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] FlowCatalogError),

    #[error("Scheduler error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A started daemon: holds the state-directory lock for as long as it lives
pub struct Daemon {
    pub paths: Paths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub scheduler: Arc<DaemonScheduler>,
}

impl Daemon {
    /// Cancel in-flight executions, wait up to `grace`, then release the lock
    pub async fn shutdown(self, grace: Duration) {
        info!("Shutting down daemon...");
        self.scheduler.shutdown(grace).await;

        if self.paths.lock.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.lock) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        info!("Daemon shutdown complete");
    }
}

/// Lock the state directory, open the store and sync the catalog into it
pub fn startup(config: &Config, paths: &Paths) -> Result<Daemon, LifecycleError> {
    let lock_file = acquire_lock(paths)?;
    match startup_inner(config, paths) {
        Ok(scheduler) => Ok(Daemon {
            paths: paths.clone(),
            lock_file,
            scheduler,
        }),
        Err(e) => {
            // Only reached while holding the lock, so the PID file is ours
            let _ = std::fs::remove_file(&paths.lock);
            Err(e)
        }
    }
}

fn acquire_lock(paths: &Paths) -> Result<File, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;

    // Don't truncate before the lock is ours: the PID belongs to the holder
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&paths.lock)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

fn startup_inner(config: &Config, paths: &Paths) -> Result<Arc<DaemonScheduler>, LifecycleError> {
    // Load the catalog before touching state (fail fast on a bad catalog)
    let catalog = FileCatalog::load(&paths.catalog, &paths.flows_dir)?;

    let store = Arc::new(Store::open(&paths.wal)?);
    log_loaded_state(&store);

    let scheduler = Scheduler::new(
        SchedulerDeps {
            store,
            interpreter: TracedInterpreter::new(DryRunInterpreter::new(config.dry_run.block_delay)),
            notify: TracedNotifyAdapter::new(DaemonNotifier::from_config(&config.notify)),
            catalog,
        },
        SystemClock,
        UuidIdGen,
        config.scheduler.clone(),
    );

    scheduler.sync_catalog()?;
    info!(state_dir = %paths.state_dir.display(), "daemon started");
    Ok(scheduler)
}

fn log_loaded_state(store: &Store) {
    let state = store.snapshot();
    info!(
        "Loaded state: {} programs, {} monitoring flows, {} sessions, {} queue entries",
        state.programs.len(),
        state.monitors.len(),
        state.sessions.len(),
        state.queue.len()
    );
    if let Some(session) = state.active_session() {
        warn!(
            session_id = %session.id,
            "session left active by previous process (recovered on first tick)"
        );
    }
}

/// Status built from persisted state, without taking the lock
///
/// Works whether or not a daemon is running: the log is only read, never opened for
/// writing. Running monitoring flows are not persisted, so only the active session
/// shows them.
pub fn read_status(paths: &Paths, now: DateTime<Utc>) -> Result<StatusReport, LifecycleError> {
    let store = Store::open_read_only(&paths.wal)?;
    Ok(StatusReport::from_store(&store, now))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
