// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the scheduler
///
/// Every field has a default, so a partial `[scheduler]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cadence of the scheduling tick
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// How long a starting cycle waits for an active monitoring flow to finish
    #[serde(with = "humantime_serde")]
    pub preempt_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub preempt_poll: Duration,
    /// Grace period after cancelling a monitoring flow before it is failed forcibly
    #[serde(with = "humantime_serde")]
    pub graceful_stop: Duration,
    #[serde(with = "humantime_serde")]
    pub graceful_poll: Duration,
    /// Upper bound on waiting for a flow's settle notices
    #[serde(with = "humantime_serde")]
    pub settle_timeout: Duration,
    /// Age after which terminal queue entries are pruned
    #[serde(with = "humantime_serde")]
    pub queue_retention: Duration,
    /// Cycle budget for programs without `max_execution`
    #[serde(with = "humantime_serde")]
    pub default_max_execution: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            preempt_timeout: Duration::from_secs(30),
            preempt_poll: Duration::from_secs(2),
            graceful_stop: Duration::from_secs(5),
            graceful_poll: Duration::from_millis(500),
            settle_timeout: Duration::from_secs(60),
            queue_retention: Duration::from_secs(60 * 60),
            default_max_execution: Duration::from_secs(60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let config: SchedulerConfig =
            toml::from_str("preempt_timeout = \"45s\"\nsettle_timeout = \"2m\"").unwrap();
        assert_eq!(config.preempt_timeout, Duration::from_secs(45));
        assert_eq!(config.settle_timeout, Duration::from_secs(120));
        assert_eq!(config.tick_interval, Duration::from_secs(60));
        assert_eq!(config.graceful_poll, Duration::from_millis(500));
    }
}
