//! Squash: shrink the graph to the nodes that still have rows.

use super::CallGraphFrame;
use crate::table::ColumnPolicy;
use crate::utils::error::{FrameError, GraphError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Options for [`CallGraphFrame::squash`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquashOptions {
    /// How rows that collapse onto one node are combined per column
    #[serde(default)]
    pub policy: ColumnPolicy,

    /// Recompute inclusive metrics on the squashed graph
    #[serde(default = "default_update_inclusive")]
    pub update_inclusive: bool,
}

fn default_update_inclusive() -> bool {
    true
}

impl Default for SquashOptions {
    fn default() -> Self {
        Self {
            policy: ColumnPolicy::default(),
            update_inclusive: true,
        }
    }
}

impl SquashOptions {
    pub fn new(policy: ColumnPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn without_inclusive_update(mut self) -> Self {
        self.update_inclusive = false;
        self
    }
}

impl CallGraphFrame {
    /// Rebuild the graph around the nodes that still have table rows
    ///
    /// Retained nodes are copied, removed nodes are elided so their retained
    /// descendants hang directly off the nearest retained ancestor, and
    /// sibling duplicates left behind are merged. Rows landing on a merged
    /// node are combined with `options.policy`.
    ///
    /// # Errors
    /// * `FrameError::EmptySquash` - the table has no rows
    /// * `FrameError::Graph` - a row refers to a node the graph cannot reach
    pub fn squash(&self, options: &SquashOptions) -> Result<CallGraphFrame, FrameError> {
        if self.table.is_empty() {
            return Err(FrameError::EmptySquash);
        }
        let retained = self.table.node_set();
        debug!(
            "Squashing {} nodes down to {} retained",
            self.graph.len(),
            retained.len()
        );

        let (mut graph, old_to_new) = self.graph.restrict(&retained)?;
        let merges = graph.normalize();

        let aggs = options
            .policy
            .resolve_all(self.table.columns(), &self.metric_columns());
        let table = self
            .table
            .rekey(
                |old| {
                    old_to_new
                        .get(&old)
                        .map(|new| merges.get(new).copied().unwrap_or(*new))
                },
                &aggs,
            )
            .map_err(|n| FrameError::Graph(GraphError::NodeNotFound(n)))?;

        let mut squashed = CallGraphFrame::from_parts(
            Arc::new(graph),
            table,
            self.exc_metrics.clone(),
            self.inc_metrics.clone(),
        );
        if options.update_inclusive {
            squashed.update_inclusive_columns()?;
        }

        info!(
            "Squashed graph has {} nodes and {} rows",
            squashed.graph.len(),
            squashed.table.len()
        );
        Ok(squashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Frame, Graph, NodeId, TraversalOrder};
    use crate::table::{AggFn, MetricTable, RowKey, Value};
    use std::collections::HashSet;

    /// main -> (wrap1 -> work, wrap2 -> work)
    fn wrapped() -> CallGraphFrame {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let mut nodes = vec![(main, "main", 1.0)];
        for wrap in ["wrap1", "wrap2"] {
            let w = g.add_child(main, Frame::named(wrap)).unwrap();
            let work = g.add_child(w, Frame::named("work")).unwrap();
            nodes.push((w, wrap, 1.0));
            nodes.push((work, "work", 5.0));
        }
        let mut t = MetricTable::new(["name", "time", "peak"]);
        for (node, name, time) in nodes {
            t.insert_row(
                RowKey::node(node),
                vec![Value::from(name), Value::from(time), Value::from(time)],
            )
            .unwrap();
        }
        CallGraphFrame::new(g, t, vec!["time".into(), "peak".into()], vec![]).unwrap()
    }

    fn without_wrappers(frame: &CallGraphFrame) -> CallGraphFrame {
        let mut f = frame.copy();
        f.table = frame
            .table()
            .filter_rows(|row| !row.text("name").unwrap_or("").starts_with("wrap"));
        f
    }

    fn names(frame: &CallGraphFrame) -> Vec<String> {
        frame
            .graph()
            .traverse(TraversalOrder::Pre)
            .filter_map(|id| frame.graph().frame(id).and_then(Frame::name))
            .collect()
    }

    #[test]
    fn test_squash_elides_and_merges() {
        let squashed = without_wrappers(&wrapped())
            .squash(&SquashOptions::default())
            .unwrap();

        assert_eq!(names(&squashed), vec!["main", "work"]);
        assert!(squashed.is_consistent());
        let work = squashed.graph().children(squashed.graph().roots()[0])[0];
        assert_eq!(squashed.table().number(&RowKey::node(work), "time"), Some(10.0));
        assert_eq!(
            squashed
                .table()
                .number(&RowKey::node(squashed.graph().roots()[0]), "time (inc)"),
            Some(11.0)
        );
    }

    #[test]
    fn test_squash_policy_per_column() {
        let options = SquashOptions::new(ColumnPolicy::default().with_column("peak", AggFn::Max));
        let squashed = without_wrappers(&wrapped()).squash(&options).unwrap();
        let work = squashed.graph().children(squashed.graph().roots()[0])[0];
        assert_eq!(squashed.table().number(&RowKey::node(work), "peak"), Some(5.0));
        assert_eq!(squashed.table().number(&RowKey::node(work), "time"), Some(10.0));
    }

    #[test]
    fn test_squash_empty_is_error() {
        let mut frame = wrapped();
        frame.table = frame.table().filter_rows(|_| false);
        assert_eq!(
            frame.squash(&SquashOptions::default()).unwrap_err(),
            FrameError::EmptySquash
        );
    }

    #[test]
    fn test_squash_allocates_fresh_nodes() {
        let frame = wrapped();
        let old: HashSet<NodeId> = frame.graph().reachable();
        let squashed = frame.squash(&SquashOptions::default()).unwrap();
        assert!(squashed.graph().reachable().is_disjoint(&old));
        assert_eq!(squashed.graph().len(), 5);
    }

    #[test]
    fn test_squash_without_inclusive_update() {
        let options = SquashOptions::default().without_inclusive_update();
        let squashed = wrapped().squash(&options).unwrap();
        assert!(!squashed.table().has_column("time (inc)"));
    }
}
