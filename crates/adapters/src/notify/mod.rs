// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator notification adapters
//!
//! Notifications are fire-and-forget from the scheduler's point of view: callers log a
//! failed send and carry on.

mod desktop;
mod noop;

pub use desktop::DesktopNotifyAdapter;
pub use noop::NoOpNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to run notifier: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("notifier exited with {0}")]
    CommandFailed(String),
}

/// Adapter for sending operator notifications
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    async fn send(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}
