//! The call-graph frame: one graph paired with one metric table.
//!
//! Every rewriting operation (filter, squash, unify, group-by, arithmetic)
//! returns a graph and table that agree with each other. Shallow copies
//! share the graph through an `Arc`; structural rewrites always allocate a
//! new graph with fresh nodes.

pub mod filter;
pub mod ops;
pub mod squash;
pub mod unify;

pub use ops::ArithOp;
pub use squash::SquashOptions;

use crate::graph::{Graph, NodeId};
use crate::table::{ColumnPolicy, MetricTable};
use crate::utils::error::FrameError;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A call graph with per-node metrics
#[derive(Debug, Clone)]
pub struct CallGraphFrame {
    pub(crate) graph: Arc<Graph>,
    pub(crate) table: MetricTable,
    pub(crate) exc_metrics: Vec<String>,
    pub(crate) inc_metrics: Vec<String>,
}

impl CallGraphFrame {
    /// Pair a graph with a table
    ///
    /// # Errors
    /// * `FrameError::InvalidConstruction` - a row is keyed by a node the
    ///   graph does not contain, or a declared metric is not a table column
    pub fn new(
        graph: impl Into<Arc<Graph>>,
        table: MetricTable,
        exc_metrics: Vec<String>,
        inc_metrics: Vec<String>,
    ) -> Result<Self, FrameError> {
        let graph = graph.into();

        if let Some(key) = table.keys().find(|k| !graph.contains(k.node)) {
            return Err(FrameError::InvalidConstruction(format!(
                "table row keyed by {} which is not a node of the graph",
                key.node
            )));
        }
        if let Some(metric) = exc_metrics
            .iter()
            .chain(inc_metrics.iter())
            .find(|m| !table.has_column(m))
        {
            return Err(FrameError::InvalidConstruction(format!(
                "metric '{}' is not a table column",
                metric
            )));
        }

        Ok(Self::from_parts(graph, table, exc_metrics, inc_metrics))
    }

    pub(crate) fn from_parts(
        graph: Arc<Graph>,
        table: MetricTable,
        exc_metrics: Vec<String>,
        inc_metrics: Vec<String>,
    ) -> Self {
        Self {
            graph,
            table,
            exc_metrics,
            inc_metrics,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The shared graph handle (two frames are unified iff these are the same `Arc`)
    pub fn shared_graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn table(&self) -> &MetricTable {
        &self.table
    }

    /// Mutable access to metric values
    ///
    /// Callers that add or remove rows must restore consistency themselves
    /// (see [`is_consistent`](Self::is_consistent)).
    pub fn table_mut(&mut self) -> &mut MetricTable {
        &mut self.table
    }

    pub fn exc_metrics(&self) -> &[String] {
        &self.exc_metrics
    }

    pub fn inc_metrics(&self) -> &[String] {
        &self.inc_metrics
    }

    /// Exclusive then inclusive metric names, without duplicates
    pub fn metric_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.exc_metrics
            .iter()
            .chain(self.inc_metrics.iter())
            .filter(|m| seen.insert(m.as_str()))
            .cloned()
            .collect()
    }

    /// Shallow copy: the table is copied, the graph is shared
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Full copy with fresh node identities
    pub fn deepcopy(&self) -> Result<Self, FrameError> {
        let mut node_map: HashMap<NodeId, NodeId> = HashMap::new();
        let graph = self.graph.copy(&mut node_map);
        let aggs = ColumnPolicy::default().resolve_all(self.table.columns(), &self.metric_columns());
        let table = self
            .table
            .rekey(|n| node_map.get(&n).copied(), &aggs)
            .map_err(|n| {
                FrameError::InvalidConstruction(format!("row node {} is not reachable", n))
            })?;
        debug!("Deep-copied frame with {} rows", table.len());
        Ok(Self::from_parts(
            Arc::new(graph),
            table,
            self.exc_metrics.clone(),
            self.inc_metrics.clone(),
        ))
    }

    /// True iff the row nodes are exactly the nodes reachable from the roots
    pub fn is_consistent(&self) -> bool {
        self.graph.reachable() == self.table.node_set()
    }

    /// Collapse secondary index levels so each node has a single row
    pub fn drop_index_levels(&self, policy: &ColumnPolicy) -> Self {
        let aggs = policy.resolve_all(self.table.columns(), &self.metric_columns());
        Self::from_parts(
            Arc::clone(&self.graph),
            self.table.drop_index_levels(&aggs),
            self.exc_metrics.clone(),
            self.inc_metrics.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Frame;
    use crate::table::{AggFn, RowKey, Value};

    fn two_node_frame() -> (CallGraphFrame, NodeId, NodeId) {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let leaf = g.add_child(main, Frame::named("leaf")).unwrap();
        let mut t = MetricTable::with_index_levels(["name", "time"], ["rank"]);
        for (node, name, rank, time) in [
            (main, "main", 0, 1.0),
            (main, "main", 1, 3.0),
            (leaf, "leaf", 0, 2.0),
            (leaf, "leaf", 1, 4.0),
        ] {
            t.insert_row(
                RowKey::with_secondary(node, vec![rank]),
                vec![Value::from(name), Value::from(time)],
            )
            .unwrap();
        }
        let frame = CallGraphFrame::new(g, t, vec!["time".into()], vec![]).unwrap();
        (frame, main, leaf)
    }

    #[test]
    fn test_new_rejects_foreign_rows() {
        let g = Graph::new();
        let mut t = MetricTable::new(["time"]);
        t.insert_row(RowKey::node(NodeId::fresh()), vec![Value::zero()])
            .unwrap();
        assert!(matches!(
            CallGraphFrame::new(g, t, vec![], vec![]),
            Err(FrameError::InvalidConstruction(_))
        ));
    }

    #[test]
    fn test_new_rejects_unknown_metric() {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let mut t = MetricTable::new(["time"]);
        t.insert_row(RowKey::node(main), vec![Value::zero()]).unwrap();
        assert!(CallGraphFrame::new(g, t, vec!["cycles".into()], vec![]).is_err());
    }

    #[test]
    fn test_copy_shares_graph() {
        let (frame, _, _) = two_node_frame();
        let copy = frame.copy();
        assert!(Arc::ptr_eq(frame.shared_graph(), copy.shared_graph()));
    }

    #[test]
    fn test_deepcopy_has_fresh_nodes() {
        let (frame, main, _) = two_node_frame();
        let deep = frame.deepcopy().unwrap();
        assert!(!Arc::ptr_eq(frame.shared_graph(), deep.shared_graph()));
        assert!(!deep.graph().contains(main));
        assert_eq!(deep.table().len(), 4);
        assert!(deep.is_consistent());
    }

    #[test]
    fn test_drop_index_levels_uses_policy() {
        let (frame, main, leaf) = two_node_frame();
        let dropped = frame.drop_index_levels(&ColumnPolicy::new(AggFn::Mean));
        assert_eq!(dropped.table().len(), 2);
        assert_eq!(dropped.table().number(&RowKey::node(main), "time"), Some(2.0));
        assert_eq!(dropped.table().number(&RowKey::node(leaf), "time"), Some(3.0));
        assert!(dropped.is_consistent());
    }
}
