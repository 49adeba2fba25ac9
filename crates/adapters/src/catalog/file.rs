// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog loaded from a TOML file plus a directory of JSON flow definitions

use super::{FlowCatalog, FlowCatalogError};
use sprig_core::{parse_catalog, Catalog, FlowDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

struct Loaded {
    catalog: Catalog,
    flows: HashMap<String, FlowDefinition>,
}

/// Catalog read once at startup
#[derive(Clone)]
pub struct FileCatalog {
    loaded: Arc<Loaded>,
}

impl FileCatalog {
    /// Load the catalog and every `*.json` flow in `flows_dir`
    ///
    /// Fails if any action or monitor references a flow that is not in `flows_dir`.
    pub fn load(catalog_path: &Path, flows_dir: &Path) -> Result<Self, FlowCatalogError> {
        let content =
            std::fs::read_to_string(catalog_path).map_err(|source| FlowCatalogError::Io {
                path: catalog_path.to_path_buf(),
                source,
            })?;
        let catalog = parse_catalog(&content)?;
        let flows = load_flows(flows_dir)?;

        if let Some(missing) = catalog
            .referenced_flows()
            .into_iter()
            .find(|id| !flows.contains_key(*id))
        {
            return Err(FlowCatalogError::FlowNotFound(missing.to_string()));
        }

        tracing::info!(
            programs = catalog.programs.len(),
            monitors = catalog.monitors.len(),
            flows = flows.len(),
            "catalog loaded"
        );
        Ok(Self {
            loaded: Arc::new(Loaded { catalog, flows }),
        })
    }
}

fn load_flows(dir: &Path) -> Result<HashMap<String, FlowDefinition>, FlowCatalogError> {
    let io_err = |source| FlowCatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut flows = HashMap::new();
    if !dir.exists() {
        return Ok(flows);
    }
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|source| FlowCatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let flow: FlowDefinition = serde_json::from_str(&content)
            .map_err(|source| FlowCatalogError::FlowParse { path, source })?;
        flows.insert(flow.id.clone(), flow);
    }
    Ok(flows)
}

impl FlowCatalog for FileCatalog {
    fn catalog(&self) -> &Catalog {
        &self.loaded.catalog
    }

    fn flow(&self, id: &str) -> Result<FlowDefinition, FlowCatalogError> {
        self.loaded
            .flows
            .get(id)
            .cloned()
            .ok_or_else(|| FlowCatalogError::FlowNotFound(id.to_string()))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
