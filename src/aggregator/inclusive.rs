//! Subtree and subgraph rollups of metric columns.

use crate::callgraph::CallGraphFrame;
use crate::graph::{NodeId, TraversalOrder};
use crate::table::{RowKey, Value};
use crate::utils::config::inclusive_name;
use crate::utils::error::FrameError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Associative operator folded over descendants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    #[default]
    Sum,
    Product,
    Min,
    Max,
}

impl Combine {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Combine::Sum => a + b,
            Combine::Product => a * b,
            Combine::Min => a.min(b),
            Combine::Max => a.max(b),
        }
    }
}

impl CallGraphFrame {
    /// Validate an input/output column pairing and seed the output columns
    ///
    /// Returns the column names results should be written to.
    fn init_sum_columns(
        &mut self,
        columns: &[String],
        out_columns: Option<&[String]>,
    ) -> Result<Vec<String>, FrameError> {
        if let Some(missing) = columns.iter().find(|c| !self.table.has_column(c)) {
            return Err(FrameError::MissingColumn(missing.clone()));
        }
        let Some(out_columns) = out_columns else {
            return Ok(columns.to_vec());
        };
        if out_columns.len() != columns.len() {
            return Err(FrameError::ColumnLengthMismatch {
                columns: columns.len(),
                out_columns: out_columns.len(),
            });
        }

        for (input, output) in columns.iter().zip(out_columns) {
            if input == output {
                continue;
            }
            self.table.ensure_column(output, Value::zero());
            let keys: Vec<RowKey> = self.table.keys().cloned().collect();
            for key in keys {
                let value = self.table.get(&key, input).cloned().unwrap_or_default();
                self.table.set(&key, output, value);
            }
        }
        Ok(out_columns.to_vec())
    }

    /// Roll `columns` up the tree in one postorder pass
    ///
    /// Each row `(node, secondary)` of the output becomes the combination of
    /// its own value with the outputs of `(child, secondary)` for every
    /// child. Only valid when the graph is a tree; see
    /// [`subgraph_sum`](Self::subgraph_sum) for DAGs.
    ///
    /// # Errors
    /// * `FrameError::MissingColumn` - an input column does not exist
    /// * `FrameError::ColumnLengthMismatch` - `out_columns` has a different length
    pub fn subtree_sum(
        &mut self,
        columns: &[String],
        out_columns: Option<&[String]>,
        combine: Combine,
    ) -> Result<(), FrameError> {
        let outputs = self.init_sum_columns(columns, out_columns)?;
        let keys_by_node = self.table.keys_by_node();
        let graph = std::sync::Arc::clone(&self.graph);

        for node in graph.traverse(TraversalOrder::Post) {
            let Some(keys) = keys_by_node.get(&node) else {
                continue;
            };
            for key in keys {
                for column in &outputs {
                    let Some(mut acc) = self.table.number(key, column) else {
                        continue;
                    };
                    for child in graph.children(node) {
                        if let Some(v) = self.table.number(&key.with_node(child), column) {
                            acc = combine.apply(acc, v);
                        }
                    }
                    self.table.set(key, column, Value::Number(acc));
                }
            }
        }
        debug!("Subtree sum over {} columns", outputs.len());
        Ok(())
    }

    /// Roll `columns` up a general DAG
    ///
    /// Dispatches to [`subtree_sum`](Self::subtree_sum) when the graph is a
    /// tree. Otherwise every node re-walks its full descendant set, counting
    /// each descendant once; this is quadratic in the worst case.
    pub fn subgraph_sum(
        &mut self,
        columns: &[String],
        out_columns: Option<&[String]>,
        combine: Combine,
    ) -> Result<(), FrameError> {
        if self.graph.is_tree() {
            return self.subtree_sum(columns, out_columns, combine);
        }

        let outputs = self.init_sum_columns(columns, out_columns)?;
        let keys_by_node = self.table.keys_by_node();
        let graph = std::sync::Arc::clone(&self.graph);

        // All results are computed before any is written back, so in-place
        // sums read only original values.
        let mut results: HashMap<(RowKey, usize), f64> = HashMap::new();
        for node in graph.traverse(TraversalOrder::Pre) {
            let Some(keys) = keys_by_node.get(&node) else {
                continue;
            };
            let descendants: Vec<NodeId> = graph
                .traverse_from(node, TraversalOrder::Pre)
                .collect();
            for key in keys {
                for (idx, column) in outputs.iter().enumerate() {
                    let folded = descendants
                        .iter()
                        .filter_map(|&d| self.table.number(&key.with_node(d), column))
                        .reduce(|a, b| combine.apply(a, b));
                    if let Some(value) = folded {
                        results.insert((key.clone(), idx), value);
                    }
                }
            }
        }

        for ((key, idx), value) in results {
            self.table.set(&key, &outputs[idx], Value::Number(value));
        }
        debug!("Subgraph sum over {} columns", outputs.len());
        Ok(())
    }

    /// Recompute every `"<metric> (inc)"` column from its exclusive metric
    ///
    /// The inclusive metric list becomes exactly those columns; previously
    /// declared inclusive names without an exclusive counterpart are no
    /// longer listed as metrics.
    pub fn update_inclusive_columns(&mut self) -> Result<(), FrameError> {
        if self.exc_metrics.is_empty() {
            return Ok(());
        }
        let exc = self.exc_metrics.clone();
        let inc: Vec<String> = exc.iter().map(|m| inclusive_name(m)).collect();
        self.subgraph_sum(&exc, Some(&inc), Combine::Sum)?;
        self.inc_metrics = inc;
        Ok(())
    }
}
