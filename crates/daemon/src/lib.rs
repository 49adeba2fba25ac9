// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sprigd internals: configuration and daemon lifecycle

pub mod config;
pub mod lifecycle;

pub use config::{Config, Paths, CONFIG_FILE};
pub use lifecycle::{read_status, startup, Daemon, DaemonNotifier, DaemonScheduler, LifecycleError};
