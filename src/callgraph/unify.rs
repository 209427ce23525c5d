//! Bringing two frames onto one shared graph.

use super::CallGraphFrame;
use crate::graph::NodeId;
use crate::table::{ColumnPolicy, MetricTable, RowKey, Value};
use crate::utils::config::{LEFT_ONLY_MARKER, MISSING_NODE_COLUMN, RIGHT_ONLY_MARKER};
use crate::utils::error::{FrameError, GraphError};
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Append `items` to `base`, skipping names already present
fn merge_names(base: &[String], items: &[String]) -> Vec<String> {
    let mut merged = base.to_vec();
    for item in items {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

impl CallGraphFrame {
    /// Table re-keyed through a union node map, colliding rows summed
    fn rekeyed_table(&self, node_map: &HashMap<NodeId, NodeId>) -> Result<MetricTable, FrameError> {
        let aggs = ColumnPolicy::default().resolve_all(self.table.columns(), &self.metric_columns());
        self.table
            .rekey(|n| node_map.get(&n).copied(), &aggs)
            .map_err(|n| FrameError::Graph(GraphError::NodeNotFound(n)))
    }

    /// Make `self` and `other` share one graph
    ///
    /// The graphs are merged with [`Graph::union`](crate::graph::Graph::union)
    /// and both tables re-keyed onto it. Each side gains the metric columns
    /// only the other side had, and a zero-filled row for every row only the
    /// other side has. When any such row was inserted, both tables get a
    /// `_missing_node` column marking rows that came only from the left
    /// (`"L"`) or only from the right (`"R"`).
    ///
    /// A no-op when both frames already share a graph. Neither frame is
    /// modified on error.
    ///
    /// # Errors
    /// * `FrameError::InvalidConstruction` - the tables have different index levels
    /// * `FrameError::Graph` - the graphs could not be merged
    pub fn unify(&mut self, other: &mut CallGraphFrame) -> Result<(), FrameError> {
        if Arc::ptr_eq(&self.graph, &other.graph) {
            debug!("Frames already share a graph, nothing to unify");
            return Ok(());
        }
        if self.table.index_names() != other.table.index_names() {
            return Err(FrameError::InvalidConstruction(format!(
                "cannot unify tables indexed by {:?} and {:?}",
                self.table.index_names(),
                other.table.index_names()
            )));
        }

        let mut node_map = HashMap::new();
        let union = self.graph.union(&other.graph, &mut node_map)?;
        let mut left = self.rekeyed_table(&node_map)?;
        let mut right = other.rekeyed_table(&node_map)?;

        let exc_metrics = merge_names(&self.exc_metrics, &other.exc_metrics);
        let inc_metrics = merge_names(&self.inc_metrics, &other.inc_metrics);
        let metrics = merge_names(&exc_metrics, &inc_metrics);
        for metric in &metrics {
            left.ensure_column(metric, Value::zero());
            right.ensure_column(metric, Value::zero());
        }

        let left_only: Vec<RowKey> = left
            .keys()
            .filter(|k| !right.contains_key(k))
            .cloned()
            .collect();
        let right_only: Vec<RowKey> = right
            .keys()
            .filter(|k| !left.contains_key(k))
            .cloned()
            .collect();

        if !left_only.is_empty() || !right_only.is_empty() {
            left.ensure_column(MISSING_NODE_COLUMN, Value::from(""));
            right.ensure_column(MISSING_NODE_COLUMN, Value::from(""));

            let zeroed: HashSet<&str> = metrics.iter().map(String::as_str).collect();
            for key in &right_only {
                let values = left.zero_filled_from(&right, key, &zeroed);
                left.push_row_unchecked(key.clone(), values);
                left.set(key, MISSING_NODE_COLUMN, Value::from(RIGHT_ONLY_MARKER));
                right.set(key, MISSING_NODE_COLUMN, Value::from(RIGHT_ONLY_MARKER));
            }
            for key in &left_only {
                let values = right.zero_filled_from(&left, key, &zeroed);
                right.push_row_unchecked(key.clone(), values);
                right.set(key, MISSING_NODE_COLUMN, Value::from(LEFT_ONLY_MARKER));
                left.set(key, MISSING_NODE_COLUMN, Value::from(LEFT_ONLY_MARKER));
            }
        }

        info!(
            "Unified graphs: {} nodes, {} rows only left, {} rows only right",
            union.len(),
            left_only.len(),
            right_only.len()
        );

        let shared = Arc::new(union);
        *self = CallGraphFrame::from_parts(
            Arc::clone(&shared),
            left,
            exc_metrics.clone(),
            inc_metrics.clone(),
        );
        *other = CallGraphFrame::from_parts(shared, right, exc_metrics, inc_metrics);
        Ok(())
    }
}
