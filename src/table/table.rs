//! The metric table: rows keyed by node (plus optional secondary keys).

use super::value::{AggFn, Value};
use crate::graph::NodeId;
use crate::utils::error::TableError;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Row key: a graph node plus values for the table's secondary index levels
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub node: NodeId,
    pub secondary: Vec<i64>,
}

impl RowKey {
    pub fn node(node: NodeId) -> Self {
        Self {
            node,
            secondary: Vec::new(),
        }
    }

    pub fn with_secondary(node: NodeId, secondary: Vec<i64>) -> Self {
        Self { node, secondary }
    }

    /// Same secondary values, different node
    pub fn with_node(&self, node: NodeId) -> Self {
        Self {
            node,
            secondary: self.secondary.clone(),
        }
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    key: &'a RowKey,
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn key(&self) -> &'a RowKey {
        self.key
    }

    pub fn node(&self) -> NodeId {
        self.key.node
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_text)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

/// Associative table of per-node metrics
///
/// Rows keep insertion order. Inserting an existing key replaces its row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    index_names: Vec<String>,
    columns: Vec<String>,
    rows: IndexMap<RowKey, Vec<Value>>,
}

impl MetricTable {
    /// Table keyed by node only
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::with_index_levels(columns, Vec::<String>::new())
    }

    /// Table keyed by node plus the named secondary levels (e.g. `rank`)
    pub fn with_index_levels<S, T>(
        columns: impl IntoIterator<Item = S>,
        index_names: impl IntoIterator<Item = T>,
    ) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            index_names: index_names.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: IndexMap::new(),
        }
    }

    /// Empty table with the same columns and index levels
    pub fn empty_like(&self) -> Self {
        Self {
            index_names: self.index_names.clone(),
            columns: self.columns.clone(),
            rows: IndexMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Append a column, filling existing rows with `fill`
    pub fn add_column(&mut self, column: impl Into<String>, fill: Value) -> Result<(), TableError> {
        let column = column.into();
        if self.has_column(&column) {
            return Err(TableError::DuplicateColumn(column));
        }
        self.columns.push(column);
        for values in self.rows.values_mut() {
            values.push(fill.clone());
        }
        Ok(())
    }

    /// Add `column` if it is missing; returns its index either way
    pub fn ensure_column(&mut self, column: &str, fill: Value) -> usize {
        match self.column_index(column) {
            Some(idx) => idx,
            None => {
                self.columns.push(column.to_string());
                for values in self.rows.values_mut() {
                    values.push(fill.clone());
                }
                self.columns.len() - 1
            }
        }
    }

    pub fn insert_row(&mut self, key: RowKey, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::LengthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        if key.secondary.len() != self.index_names.len() {
            return Err(TableError::IndexLevelMismatch {
                expected: self.index_names.len(),
                actual: key.secondary.len(),
            });
        }
        self.rows.insert(key, values);
        Ok(())
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.rows.contains_key(key)
    }

    pub fn get(&self, key: &RowKey, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(key).and_then(|values| values.get(idx))
    }

    pub fn number(&self, key: &RowKey, column: &str) -> Option<f64> {
        self.get(key, column).and_then(Value::as_number)
    }

    /// Overwrite one cell; returns `false` when the row or column is missing
    pub fn set(&mut self, key: &RowKey, column: &str, value: Value) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(key) {
            Some(values) => {
                values[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, key: &RowKey) -> Option<RowView<'_>> {
        self.rows.get_key_value(key).map(|(key, values)| RowView {
            key,
            columns: &self.columns,
            values,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &RowKey> {
        self.rows.keys()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|(key, values)| RowView {
            key,
            columns: &self.columns,
            values,
        })
    }

    /// Distinct row nodes in first-appearance order
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.rows
            .keys()
            .filter(|k| seen.insert(k.node))
            .map(|k| k.node)
            .collect()
    }

    pub fn node_set(&self) -> HashSet<NodeId> {
        self.rows.keys().map(|k| k.node).collect()
    }

    /// Row keys grouped by node
    pub fn keys_by_node(&self) -> HashMap<NodeId, Vec<RowKey>> {
        let mut grouped: HashMap<NodeId, Vec<RowKey>> = HashMap::new();
        for key in self.rows.keys() {
            grouped.entry(key.node).or_default().push(key.clone());
        }
        grouped
    }

    /// Rows satisfying `predicate`
    pub fn filter_rows(&self, predicate: impl Fn(&RowView<'_>) -> bool) -> MetricTable {
        let mut filtered = self.empty_like();
        for row in self.rows() {
            if predicate(&row) {
                filtered
                    .rows
                    .insert(row.key().clone(), row.values().to_vec());
            }
        }
        filtered
    }

    /// Rows whose node is in `nodes`
    pub fn retain_nodes(&self, nodes: &HashSet<NodeId>) -> MetricTable {
        self.filter_rows(|row| nodes.contains(&row.node()))
    }

    /// Group rows by `key_fn` and collapse each group column-wise
    ///
    /// `aggs` holds one function per column. Groups keep first-appearance
    /// order. The resulting table keeps this table's index levels, so
    /// `key_fn` must produce keys with matching secondary arity.
    pub fn aggregate_by(
        &self,
        key_fn: impl Fn(&RowView<'_>) -> RowKey,
        aggs: &[AggFn],
    ) -> MetricTable {
        let mut groups: IndexMap<RowKey, Vec<&[Value]>> = IndexMap::new();
        for row in self.rows() {
            groups.entry(key_fn(&row)).or_default().push(row.values());
        }

        let mut collapsed = self.empty_like();
        for (key, members) in groups {
            let values = (0..self.columns.len())
                .map(|col| {
                    let cells: Vec<&Value> = members.iter().map(|m| &m[col]).collect();
                    aggs.get(col).copied().unwrap_or(AggFn::First).apply(&cells)
                })
                .collect();
            collapsed.rows.insert(key, values);
        }
        collapsed
    }

    /// Move every row to a new node, collapsing rows that collide
    ///
    /// `node_fn` returning `None` means the node has no image; the first
    /// such node is returned as the error.
    pub fn rekey(
        &self,
        node_fn: impl Fn(NodeId) -> Option<NodeId>,
        aggs: &[AggFn],
    ) -> Result<MetricTable, NodeId> {
        if let Some(missing) = self.rows.keys().find(|k| node_fn(k.node).is_none()) {
            return Err(missing.node);
        }
        Ok(self.aggregate_by(
            |row| {
                let key = row.key();
                key.with_node(node_fn(key.node).unwrap_or(key.node))
            },
            aggs,
        ))
    }

    /// Collapse all secondary levels, leaving one row per node
    pub fn drop_index_levels(&self, aggs: &[AggFn]) -> MetricTable {
        self.collapse_to_nodes(|row| row.node(), aggs)
    }

    /// Group rows by the node `node_fn` assigns them, one row per node
    ///
    /// Secondary index levels are dropped.
    pub fn collapse_to_nodes(
        &self,
        node_fn: impl Fn(&RowView<'_>) -> NodeId,
        aggs: &[AggFn],
    ) -> MetricTable {
        let mut collapsed = self.aggregate_by(|row| RowKey::node(node_fn(row)), aggs);
        collapsed.index_names.clear();
        collapsed
    }

    /// Copy of the row at `key` from `source` with `zeroed` columns set to 0
    ///
    /// Columns this table has but `source` lacks are zero-filled too.
    pub(crate) fn zero_filled_from(
        &self,
        source: &MetricTable,
        key: &RowKey,
        zeroed: &HashSet<&str>,
    ) -> Vec<Value> {
        self.columns
            .iter()
            .map(|column| {
                if zeroed.contains(column.as_str()) {
                    Value::zero()
                } else {
                    source.get(key, column).cloned().unwrap_or_default()
                }
            })
            .collect()
    }

    /// Insert a row without arity checks (caller built it from this table's columns)
    pub(crate) fn push_row_unchecked(&mut self, key: RowKey, values: Vec<Value>) {
        self.rows.insert(key, values);
    }

    /// Apply `f` to every numeric cell of `column`
    pub(crate) fn update_column(&mut self, column: &str, mut f: impl FnMut(&RowKey, f64) -> f64) {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        for (key, values) in self.rows.iter_mut() {
            if let Some(v) = values[idx].as_number() {
                values[idx] = Value::Number(f(key, v));
            }
        }
    }
}
