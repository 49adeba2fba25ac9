// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sprig-storage: durable scheduler state
//!
//! Every change is appended to a write-ahead log and then applied to the in-memory
//! [`MaterializedState`]. Reads go through the same lock, so a read issued after a
//! write always observes it.

mod state;
mod store;
mod traits;
mod wal;

pub use state::MaterializedState;
pub use store::{Store, StoreError};
pub use traits::{
    Admission, Deferral, MonitorStore, ProgramStore, QueueStore, SchedulerStore, SessionStore,
};
pub use wal::{Wal, WalError};
