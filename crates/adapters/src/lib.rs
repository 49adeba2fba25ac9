// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the flow interpreter, operator notifications and the
//! flow catalog

pub mod catalog;
pub mod interpreter;
pub mod notify;
pub mod traced;

pub use catalog::{FileCatalog, FlowCatalog, FlowCatalogError};
pub use interpreter::{DryRunInterpreter, ExecutionNotice, FlowError, FlowInterpreter, NoticeBus};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use traced::{TracedInterpreter, TracedNotifyAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use catalog::FakeCatalog;
#[cfg(any(test, feature = "test-support"))]
pub use interpreter::{FakeFlowInterpreter, InterpreterCall, Scripted};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
