// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduler

use sprig_adapters::FlowCatalogError;
use sprig_storage::StoreError;
use thiserror::Error;

/// Errors that can occur in the scheduler
///
/// Flow failures are not errors here: they are recorded against their cycle or
/// monitoring flow and scheduling carries on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("catalog error: {0}")]
    Catalog(#[from] FlowCatalogError),
    #[error("program not found: {0}")]
    ProgramNotFound(String),
    #[error("cycle {cycle} not found in program {program}")]
    CycleNotFound { program: String, cycle: String },
}
