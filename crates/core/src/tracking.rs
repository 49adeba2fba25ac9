// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-day cycle bookkeeping, reset at local midnight

use crate::program::CycleKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyTracking {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_cycles: Vec<CycleKey>,
    #[serde(default)]
    pub cycle_executions: u64,
}

impl DailyTracking {
    pub fn reset(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.completed_cycles.clear();
        self.cycle_executions = 0;
    }

    /// Count a finished cycle run; successful runs are listed once per day
    pub fn record_cycle(&mut self, key: CycleKey, succeeded: bool) {
        self.cycle_executions += 1;
        if succeeded && !self.completed_cycles.contains(&key) {
            self.completed_cycles.push(key);
        }
    }
}
