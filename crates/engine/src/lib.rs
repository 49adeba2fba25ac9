// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Sprig execution scheduler
//!
//! Runs program cycles at their local start times and monitoring flows on their
//! intervals, with at most one execution touching the hardware at a time.

mod config;
mod cycle;
mod daily;
mod drain;
mod error;
mod guards;
mod monitor;
mod preempt;
mod recovery;
mod scheduler;
mod settle;
mod status;
mod sync;
mod tick;
mod timers;

#[cfg(test)]
mod test_support;

pub use config::SchedulerConfig;
pub use cycle::CycleFailure;
pub use error::EngineError;
pub use monitor::{MonitorOutcome, MONITORING_CYCLE};
pub use preempt::PREEMPTED_REASON;
pub use recovery::INTERRUPTED_REASON;
pub use scheduler::{Scheduler, SchedulerDeps, SHUTDOWN_REASON, STOPPED_REASON};
pub use status::{QueueSummary, RunningCycleStatus, RunningMonitorStatus, StatusReport};
pub use sync::SyncReport;
pub use tick::TickReport;
