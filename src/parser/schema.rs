//! JSON schema for the literal call-graph form.
//!
//! The literal form is a forest of nested nodes, each carrying its own
//! metrics. It is what `read_literal` accepts and `write_literal` writes.
//! Schema is versioned to allow future evolution.

use crate::graph::Frame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of the literal form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralNode {
    /// Display name; also the frame when `frame` is absent
    pub name: String,

    /// Full frame attributes (e.g. `{"name": "solve", "type": "function"}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,

    /// Metric values; names containing `(inc)` are inclusive
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LiteralNode>,
}

impl LiteralNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame: None,
            metrics: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }

    pub fn with_child(mut self, child: LiteralNode) -> Self {
        self.children.push(child);
        self
    }

    /// The frame this node stands for
    pub fn resolved_frame(&self) -> Frame {
        self.frame
            .clone()
            .unwrap_or_else(|| Frame::named(self.name.clone()))
    }
}

/// Top-level document written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralDocument {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the document was generated
    pub generated_at: String,

    /// Root nodes in order
    pub graph: Vec<LiteralNode>,
}

/// Anything `parse_literal` accepts: a full document or a bare forest
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LiteralInput {
    Document(LiteralDocument),
    Forest(Vec<LiteralNode>),
}

impl LiteralInput {
    pub fn into_forest(self) -> Vec<LiteralNode> {
        match self {
            LiteralInput::Document(doc) => doc.graph,
            LiteralInput::Forest(forest) => forest,
        }
    }
}
