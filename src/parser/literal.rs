//! Importer for the literal JSON form.

use super::schema::{LiteralInput, LiteralNode};
use crate::callgraph::CallGraphFrame;
use crate::graph::{Graph, NodeId};
use crate::table::{MetricTable, RowKey, Value};
use crate::utils::config::{is_inclusive_name, NAME_COLUMN, SCHEMA_VERSION};
use crate::utils::error::{FrameError, ParseError};
use indexmap::IndexSet;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Build a frame from a literal forest
///
/// **Public** - main entry point for literal input
///
/// # Arguments
/// * `raw` - Either a `LiteralDocument` or a bare array of nodes
///
/// # Returns
/// A consistent frame. Inclusive columns are computed when the input
/// declares none.
///
/// # Errors
/// * `ParseError::JsonError` - The JSON does not match the literal schema
/// * `ParseError::InvalidFormat` - The forest is empty
pub fn parse_literal(raw: &serde_json::Value) -> Result<CallGraphFrame, ParseError> {
    let input: LiteralInput = serde_json::from_value(raw.clone())?;
    if let LiteralInput::Document(doc) = &input {
        if doc.version.split('.').next() != SCHEMA_VERSION.split('.').next() {
            warn!(
                "Literal schema version {} differs from supported {}",
                doc.version, SCHEMA_VERSION
            );
        }
    }
    from_literal(&input.into_forest())
}

/// Build a frame from already-deserialized literal nodes
pub fn from_literal(forest: &[LiteralNode]) -> Result<CallGraphFrame, ParseError> {
    if forest.is_empty() {
        return Err(ParseError::InvalidFormat(
            "literal graph has no root nodes".to_string(),
        ));
    }

    let metrics = collect_metric_names(forest);
    let mut columns = vec![NAME_COLUMN.to_string()];
    columns.extend(metrics.iter().cloned());
    let mut table = MetricTable::new(columns);
    let mut graph = Graph::new();

    let mut stack: Vec<(NodeId, &LiteralNode)> = forest
        .iter()
        .map(|lit| (graph.add_root(lit.resolved_frame()), lit))
        .collect();
    stack.reverse();

    while let Some((id, lit)) = stack.pop() {
        let mut values = vec![Value::from(lit.name.as_str())];
        values.extend(
            metrics
                .iter()
                .map(|m| Value::Number(lit.metrics.get(m).copied().unwrap_or(0.0))),
        );
        table
            .insert_row(RowKey::node(id), values)
            .map_err(FrameError::from)?;

        let mut children = Vec::with_capacity(lit.children.len());
        for child in &lit.children {
            let child_id = graph
                .add_child(id, child.resolved_frame())
                .map_err(FrameError::from)?;
            children.push((child_id, child));
        }
        stack.extend(children.into_iter().rev());
    }
    graph.enumerate_traverse();

    let (inc, exc): (Vec<String>, Vec<String>) =
        metrics.into_iter().partition(|m| is_inclusive_name(m));
    let needs_inclusive = inc.is_empty();
    let mut frame = CallGraphFrame::new(graph, table, exc, inc)?;
    if needs_inclusive {
        frame.update_inclusive_columns()?;
    }

    debug!(
        "Imported literal graph: {} nodes, {} exclusive metrics",
        frame.graph().len(),
        frame.exc_metrics().len()
    );
    Ok(frame)
}

/// Metric names in first-appearance (preorder) order
///
/// **Private** - column layout of the imported table
fn collect_metric_names(forest: &[LiteralNode]) -> IndexSet<String> {
    let mut names = IndexSet::new();
    let mut stack: Vec<&LiteralNode> = forest.iter().rev().collect();
    while let Some(lit) = stack.pop() {
        names.extend(lit.metrics.keys().cloned());
        stack.extend(lit.children.iter().rev());
    }
    names
}

/// Read a literal JSON file
pub fn read_literal(path: impl AsRef<Path>) -> Result<CallGraphFrame, ParseError> {
    let path = path.as_ref();
    debug!("Reading literal graph from: {}", path.display());
    let contents = fs::read_to_string(path)?;
    let raw: serde_json::Value = serde_json::from_str(&contents)?;
    parse_literal(&raw)
}
