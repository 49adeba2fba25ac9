// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sprig.toml`: where state lives, where the catalog is, and scheduler timing

use crate::lifecycle::LifecycleError;
use serde::Deserialize;
use sprig_engine::SchedulerConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "sprig.toml";

/// Daemon configuration as written in the file
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub state_dir: Option<PathBuf>,
    pub catalog: PathBuf,
    pub flows_dir: PathBuf,
    /// How long `run` waits for in-flight executions after a stop signal
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
    pub scheduler: SchedulerConfig,
    pub notify: NotifyConfig,
    pub dry_run: DryRunConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: None,
            catalog: PathBuf::from("catalog.toml"),
            flows_dir: PathBuf::from("flows"),
            shutdown_grace: Duration::from_secs(10),
            scheduler: SchedulerConfig::default(),
            notify: NotifyConfig::default(),
            dry_run: DryRunConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Notifier executable; notifications are only logged when unset
    pub command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DryRunConfig {
    /// Pause between blocks while walking a flow
    #[serde(with = "humantime_serde")]
    pub block_delay: Duration,
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            block_delay: Duration::from_millis(200),
        }
    }
}

/// Fully resolved paths derived from a [`Config`]
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub catalog: PathBuf,
    pub flows_dir: PathBuf,
    pub wal: PathBuf,
    pub lock: PathBuf,
    pub log: PathBuf,
}

impl Config {
    /// Read `path`, or fall back to defaults when `path` is the implicit
    /// `sprig.toml` and does not exist
    pub fn load(path: &Path, explicit: bool) -> Result<Self, LifecycleError> {
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::ConfigRead(path.to_path_buf(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, LifecycleError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve every path against `base` (the config file's directory)
    pub fn paths(&self, base: &Path) -> Result<Paths, LifecycleError> {
        let state_dir = match &self.state_dir {
            Some(dir) => base.join(dir),
            None => default_state_dir()?,
        };
        Ok(Paths {
            catalog: base.join(&self.catalog),
            flows_dir: base.join(&self.flows_dir),
            wal: state_dir.join("wal.jsonl"),
            lock: state_dir.join("sprigd.pid"),
            log: state_dir.join("sprigd.log"),
            state_dir,
        })
    }
}

/// `$XDG_STATE_HOME/sprig`, or `~/.local/state/sprig`
fn default_state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sprig"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/sprig"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
