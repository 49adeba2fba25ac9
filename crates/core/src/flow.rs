// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow definitions handed to the interpreter
//!
//! The scheduler treats a flow as opaque: an id, a name and a list of blocks
//! that only the interpreter understands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Variables passed to a flow run, merged from action overrides
pub type Variables = Map<String, Value>;

/// A single step of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// An executable flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<FlowBlock>,
}

impl FlowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            blocks: Vec::new(),
        }
    }

    pub fn with_block(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.blocks.push(FlowBlock {
            id: id.into(),
            kind: kind.into(),
            params: Map::new(),
        });
        self
    }
}
