// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable wall-clock handling
//!
//! Cycles are scheduled by local time of day (`HH:MM`) and the daily reset fires at local
//! midnight, so the clock hands out wall-clock time rather than monotonic instants.
//! Monotonic waits (polls, timeouts) go through `tokio::time` directly.

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    /// Create a fake clock frozen at the given instant
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(instant)),
        }
    }

    /// Create a fake clock frozen at a local date and time of day
    ///
    /// Falls back to the Unix epoch for local times that do not exist (DST gaps).
    pub fn at_local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let instant = Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default();
        Self::at(instant)
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = current.checked_add_signed(delta).unwrap_or(*current);
    }

    /// Set the clock to a specific instant
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Local time of day as `HH:MM`, the format cycle start times are written in
pub fn local_hhmm(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Local calendar date of an instant
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

/// Whether two instants fall in the same local `HH:MM` of the same day
pub fn same_local_minute(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    local_date(a) == local_date(b) && local_hhmm(a) == local_hhmm(b)
}

/// The first local midnight strictly after `at`
pub fn next_local_midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    local_date(at)
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| at + TimeDelta::days(1))
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
