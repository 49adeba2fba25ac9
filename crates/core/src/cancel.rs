// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation shared between the scheduler and a running flow
//!
//! The scheduler signals, the interpreter polls. Nothing is interrupted forcibly:
//! a flow stops at its next checkpoint after [`CancellationToken::cancel`].

use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: bool,
    reason: Option<String>,
}

/// A clonable cancellation signal carrying a reason
///
/// Clones share state, so the scheduler can keep one handle in its registry while the
/// interpreter holds another.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<Mutex<TokenState>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. The first reason wins; later calls keep it.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.cancelled {
            state.cancelled = true;
            state.reason = Some(reason.into());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).cancelled
    }

    pub fn reason(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reason
            .clone()
    }

    /// Clear the signal so the token can be handed to a new execution
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cancelled = false;
        state.reason = None;
    }

    /// Checkpoint for interpreters: `Err(reason)` once cancelled
    pub fn checkpoint(&self) -> Result<(), String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.cancelled {
            Err(state
                .reason
                .clone()
                .unwrap_or_else(|| "cancelled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
