// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow catalog adapters
//!
//! The catalog resolves what a cycle runs: its ordered action list, and the flow
//! definition behind each action or monitoring flow.

mod file;

pub use file::FileCatalog;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCatalog;

use sprig_core::{ActionTemplate, Catalog, CatalogError, FlowDefinition};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog loading and lookup
#[derive(Debug, Error)]
pub enum FlowCatalogError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid flow file {}: {source}", path.display())]
    FlowParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("flow not found: {0}")]
    FlowNotFound(String),
}

/// Source of program structure and flow definitions
pub trait FlowCatalog: Clone + Send + Sync + 'static {
    /// The declared programs and monitoring flows
    fn catalog(&self) -> &Catalog;

    fn flow(&self, id: &str) -> Result<FlowDefinition, FlowCatalogError>;

    /// Ordered actions of a cycle
    fn cycle_actions(
        &self,
        program: &str,
        cycle: &str,
    ) -> Result<Vec<ActionTemplate>, FlowCatalogError> {
        Ok(self.catalog().cycle_actions(program, cycle)?)
    }
}
