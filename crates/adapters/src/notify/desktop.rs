// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line notifier (`notify-send` and compatible tools)

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;

/// Runs `<command> <title> <message>` for each notification
#[derive(Clone, Debug)]
pub struct DesktopNotifyAdapter {
    command: String,
}

impl DesktopNotifyAdapter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for DesktopNotifyAdapter {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn send(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let output = tokio::process::Command::new(&self.command)
            .arg(title)
            .arg(message)
            .output()
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(NotifyError::CommandFailed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
