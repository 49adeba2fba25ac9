// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory catalog for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{FlowCatalog, FlowCatalogError};
use sprig_core::{ActionDef, Catalog, CycleDef, FlowDefinition, MonitorDef, ProgramDef};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Catalog assembled in code
///
/// Every flow referenced through the builders gets an empty definition unless one
/// was registered with [`FakeCatalog::with_flow`].
#[derive(Clone, Default)]
pub struct FakeCatalog {
    catalog: Arc<Catalog>,
    flows: Arc<HashMap<String, FlowDefinition>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a program with no cycles
    pub fn with_program(mut self, id: &str) -> Self {
        Arc::make_mut(&mut self.catalog).programs.push(ProgramDef {
            id: id.to_string(),
            name: format!("{id} program"),
            max_execution: None,
            active: true,
            cycles: Vec::new(),
        });
        self
    }

    /// Add a cycle running `flows` in order to an already added program
    pub fn with_cycle(mut self, program: &str, cycle: &str, start: &str, flows: &[&str]) -> Self {
        for flow in flows {
            self.ensure_flow(flow);
        }
        if let Some(def) = Arc::make_mut(&mut self.catalog)
            .programs
            .iter_mut()
            .find(|p| p.id == program)
        {
            def.cycles.push(CycleDef {
                id: cycle.to_string(),
                start: start.to_string(),
                active: true,
                actions: flows
                    .iter()
                    .map(|flow| ActionDef {
                        name: flow.to_string(),
                        flow: flow.to_string(),
                        overrides: Default::default(),
                    })
                    .collect(),
            });
        }
        self
    }

    /// Set the maximum execution time of an already added program
    pub fn with_max_execution(mut self, program: &str, max: Duration) -> Self {
        if let Some(def) = Arc::make_mut(&mut self.catalog)
            .programs
            .iter_mut()
            .find(|p| p.id == program)
        {
            def.max_execution = Some(max);
        }
        self
    }

    /// Add a monitoring flow running `flow` every `interval` minutes
    pub fn with_monitor(mut self, id: &str, flow: &str, interval: u32) -> Self {
        self.ensure_flow(flow);
        Arc::make_mut(&mut self.catalog).monitors.push(MonitorDef {
            id: id.to_string(),
            name: format!("{id} monitor"),
            flow: flow.to_string(),
            interval,
            active: true,
        });
        self
    }

    pub fn with_flow(mut self, flow: FlowDefinition) -> Self {
        Arc::make_mut(&mut self.flows).insert(flow.id.clone(), flow);
        self
    }

    /// Forget a flow definition so lookups fail
    pub fn without_flow(mut self, id: &str) -> Self {
        Arc::make_mut(&mut self.flows).remove(id);
        self
    }

    fn ensure_flow(&mut self, id: &str) {
        Arc::make_mut(&mut self.flows)
            .entry(id.to_string())
            .or_insert_with(|| FlowDefinition::new(id, id));
    }
}

impl FlowCatalog for FakeCatalog {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn flow(&self, id: &str) -> Result<FlowDefinition, FlowCatalogError> {
        self.flows
            .get(id)
            .cloned()
            .ok_or_else(|| FlowCatalogError::FlowNotFound(id.to_string()))
    }
}
