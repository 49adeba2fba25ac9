// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sprig-core: domain model for the Sprig hydroponics scheduler
//!
//! This crate provides:
//! - Wall-clock and id abstractions that tests can control
//! - Programs, cycles, monitoring flows, queue entries and execution sessions
//! - The cooperative cancellation token shared with flow interpreters
//! - Operations persisted to the write-ahead log
//! - The catalog file format (programs, cycles, actions, monitoring flows)

pub mod cancel;
pub mod catalog;
pub mod clock;
pub mod flow;
pub mod id;
pub mod monitoring;
pub mod operation;
pub mod program;
pub mod queue;
pub mod session;
pub mod tracking;

pub use cancel::CancellationToken;
pub use catalog::{parse_catalog, ActionDef, Catalog, CatalogError, CycleDef, MonitorDef, ProgramDef};
pub use clock::{
    local_date, local_hhmm, next_local_midnight, same_local_minute, Clock, FakeClock, SystemClock,
};
pub use flow::{FlowBlock, FlowDefinition, Variables};
pub use id::{CycleId, EntryId, IdGen, MonitorId, ProgramId, SequentialIdGen, SessionId, UuidIdGen};
pub use monitoring::MonitoringFlow;
pub use operation::Operation;
pub use program::{ActionTemplate, ActiveCycle, ActiveProgram, CycleKey, ProgramStatus, SkippedCycle};
pub use queue::{EntryStatus, PausedBy, QueueEntry};
pub use session::{CycleRun, ExecutionSession, FlowRun, RunStatus, SessionKind, SessionStatus};
pub use tracking::DailyTracking;
