// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notifier for when no notification command is configured.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;

/// Notifier that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifyAdapter;

impl NoOpNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoOpNotifyAdapter {
    async fn send(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        tracing::debug!(title, message, "notification (no notifier configured)");
        Ok(())
    }
}
