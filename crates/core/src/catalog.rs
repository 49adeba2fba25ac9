// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog file format
//!
//! The catalog declares programs (with their cycles and ordered actions) and monitoring
//! flows. Flow definitions themselves live in separate JSON files and are referenced by id.
//!
//! ```toml
//! [[program]]
//! id = "tomatoes"
//! name = "Tomato feed"
//! max_execution = "90m"
//!
//! [[program.cycle]]
//! id = "morning"
//! start = "08:00"
//!
//! [[program.cycle.action]]
//! name = "Mix nutrients"
//! flow = "mix-nutrients"
//! overrides = { ec_target = 1.8 }
//!
//! [[monitor]]
//! id = "ph"
//! name = "pH check"
//! flow = "read-ph"
//! interval = 5
//! ```

use crate::flow::Variables;
use crate::id::ProgramId;
use crate::monitoring::{MonitoringFlow, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};
use crate::program::{ActionTemplate, ActiveCycle, ActiveProgram, ProgramStatus};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while parsing or validating a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("cycle {program}/{cycle}: start time {value:?} is not HH:MM")]
    InvalidStartTime {
        program: String,
        cycle: String,
        value: String,
    },
    #[error("monitor {monitor}: interval {value} outside 1..=1440 minutes")]
    InvalidInterval { monitor: String, value: u32 },
    #[error("cycle {program}/{cycle} has no actions")]
    EmptyCycle { program: String, cycle: String },
    #[error("unknown program: {0}")]
    UnknownProgram(String),
    #[error("unknown cycle {cycle} in program {program}")]
    UnknownCycle { program: String, cycle: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    pub flow: String,
    #[serde(default)]
    pub overrides: Variables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDef {
    pub id: String,
    /// Local time of day, `HH:MM`
    pub start: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDef {
    pub id: String,
    pub name: String,
    #[serde(with = "humantime_serde", default)]
    pub max_execution: Option<Duration>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, rename = "cycle")]
    pub cycles: Vec<CycleDef>,
}

impl ProgramDef {
    /// Activate this program with fresh runtime state
    pub fn activate(&self, now: DateTime<Utc>) -> ActiveProgram {
        ActiveProgram {
            id: ProgramId::from(self.id.as_str()),
            definition_id: self.id.clone(),
            name: self.name.clone(),
            status: if self.active {
                ProgramStatus::Running
            } else {
                ProgramStatus::Stopped
            },
            max_execution_time: self.max_execution,
            cycles: self
                .cycles
                .iter()
                .map(|c| {
                    let mut cycle = ActiveCycle::new(c.id.as_str(), c.start.as_str());
                    cycle.is_active = c.active;
                    cycle
                })
                .collect(),
            skipped_cycles: Vec::new(),
            total_executions: 0,
            activated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDef {
    pub id: String,
    pub name: String,
    pub flow: String,
    /// Minutes between executions
    pub interval: u32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl MonitorDef {
    pub fn to_flow(&self, now: DateTime<Utc>) -> MonitoringFlow {
        let mut flow = MonitoringFlow::new(
            self.id.as_str(),
            self.flow.clone(),
            self.name.clone(),
            self.interval,
            now,
        );
        flow.is_active = self.active;
        flow
    }
}

/// A parsed catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "program")]
    pub programs: Vec<ProgramDef>,
    #[serde(default, rename = "monitor")]
    pub monitors: Vec<MonitorDef>,
}

impl Catalog {
    pub fn program(&self, id: &str) -> Option<&ProgramDef> {
        self.programs.iter().find(|p| p.id == id)
    }

    /// Ordered action list of a cycle
    pub fn cycle_actions(
        &self,
        program: &str,
        cycle: &str,
    ) -> Result<Vec<ActionTemplate>, CatalogError> {
        let def = self
            .program(program)
            .ok_or_else(|| CatalogError::UnknownProgram(program.to_string()))?;
        let cycle_def = def
            .cycles
            .iter()
            .find(|c| c.id == cycle)
            .ok_or_else(|| CatalogError::UnknownCycle {
                program: program.to_string(),
                cycle: cycle.to_string(),
            })?;
        Ok(cycle_def
            .actions
            .iter()
            .map(|a| ActionTemplate {
                name: a.name.clone(),
                flow: a.flow.clone(),
                overrides: a.overrides.clone(),
            })
            .collect())
    }

    /// Every flow id referenced by an action or a monitor
    pub fn referenced_flows(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.programs
            .iter()
            .flat_map(|p| p.cycles.iter())
            .flat_map(|c| c.actions.iter().map(|a| a.flow.as_str()))
            .chain(self.monitors.iter().map(|m| m.flow.as_str()))
            .filter(|f| seen.insert(*f))
            .collect()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut program_ids = HashSet::new();
        for program in &self.programs {
            if !program_ids.insert(program.id.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "program",
                    id: program.id.clone(),
                });
            }
            let mut cycle_ids = HashSet::new();
            for cycle in &program.cycles {
                if !cycle_ids.insert(cycle.id.as_str()) {
                    return Err(CatalogError::Duplicate {
                        kind: "cycle",
                        id: format!("{}/{}", program.id, cycle.id),
                    });
                }
                if !is_hhmm(&cycle.start) {
                    return Err(CatalogError::InvalidStartTime {
                        program: program.id.clone(),
                        cycle: cycle.id.clone(),
                        value: cycle.start.clone(),
                    });
                }
                if cycle.actions.is_empty() {
                    return Err(CatalogError::EmptyCycle {
                        program: program.id.clone(),
                        cycle: cycle.id.clone(),
                    });
                }
            }
        }

        let mut monitor_ids = HashSet::new();
        for monitor in &self.monitors {
            if !monitor_ids.insert(monitor.id.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "monitor",
                    id: monitor.id.clone(),
                });
            }
            if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&monitor.interval) {
                return Err(CatalogError::InvalidInterval {
                    monitor: monitor.id.clone(),
                    value: monitor.interval,
                });
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Zero-padded 24h `HH:MM`, the only form the tick compares against
fn is_hhmm(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

/// Parse and validate a catalog from TOML content
pub fn parse_catalog(content: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = toml::from_str(content)?;
    catalog.validate()?;
    Ok(catalog)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
