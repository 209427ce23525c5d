//! Collapsing nodes into super-nodes by a row key.

use crate::callgraph::CallGraphFrame;
use crate::graph::{Frame, Graph, NodeId, TraversalOrder};
use crate::table::{ColumnPolicy, RowKey, RowView, Value};
use crate::utils::config::NAME_COLUMN;
use crate::utils::error::FrameError;
use indexmap::IndexMap;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

impl CallGraphFrame {
    /// Group rows by `group_fn` and build one super-node per group
    ///
    /// Super-nodes get the frame `{name: <key>, type: <group_name>}` and
    /// appear in first-appearance order of their key. An old node belongs to
    /// the group of its first row, and all of its rows (every secondary key)
    /// follow it into that group. Old edges are mapped through the grouping
    /// with duplicates and self-edges dropped, so the result may contain
    /// cycles. The table is aggregated per group with `policy` and keeps one
    /// row per super-node. Inclusive columns are aggregated like any other
    /// metric and are not recomputed.
    ///
    /// # Errors
    /// * `FrameError::InvalidConstruction` - some graph node has no row, or
    ///   some row has no node in the graph
    pub fn groupby_aggregate(
        &self,
        group_fn: impl Fn(&RowView<'_>) -> String,
        group_name: &str,
        policy: &ColumnPolicy,
    ) -> Result<CallGraphFrame, FrameError> {
        if !self.is_consistent() {
            return Err(FrameError::InvalidConstruction(
                "group-by needs a row for every reachable node; squash first".to_string(),
            ));
        }

        let mut graph = Graph::new();
        let mut supers: IndexMap<String, NodeId> = IndexMap::new();
        let mut node_super: HashMap<NodeId, NodeId> = HashMap::new();

        for row in self.table.rows() {
            if node_super.contains_key(&row.node()) {
                continue;
            }
            let key = group_fn(&row);
            let super_node = match supers.get(&key) {
                Some(&id) => id,
                None => {
                    let id = graph.add_node(Frame::with_type(key.clone(), group_name));
                    supers.insert(key, id);
                    id
                }
            };
            node_super.insert(row.node(), super_node);
        }

        for old in self.graph.traverse(TraversalOrder::Pre) {
            let Some(&parent) = node_super.get(&old) else {
                continue;
            };
            if self.graph.parents(old).is_empty() {
                graph.push_root(parent)?;
            }
            for child in self.graph.children(old) {
                if let Some(&child) = node_super.get(&child) {
                    if child != parent {
                        graph.add_edge(parent, child)?;
                    }
                }
            }
        }
        graph.enumerate_traverse();

        let aggs = policy.resolve_all(self.table.columns(), &self.metric_columns());
        let mut table = self.table.collapse_to_nodes(
            |row| node_super.get(&row.node()).copied().unwrap_or(row.node()),
            &aggs,
        );
        if table.has_column(NAME_COLUMN) {
            for (key, &id) in &supers {
                table.set(&RowKey::node(id), NAME_COLUMN, Value::from(key.as_str()));
            }
        }

        debug!(
            "Grouped {} nodes into {} '{}' super-nodes",
            node_super.len(),
            supers.len(),
            group_name
        );
        info!("Group-by produced {} edges", graph.edge_count());
        Ok(CallGraphFrame::from_parts(
            Arc::new(graph),
            table,
            self.exc_metrics.clone(),
            self.inc_metrics.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AggFn, MetricTable};

    /// main(libc) -> a(app) -> b(app), main -> c(libm) -> d(libc)
    fn modules() -> CallGraphFrame {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let a = g.add_child(main, Frame::named("a")).unwrap();
        let b = g.add_child(a, Frame::named("b")).unwrap();
        let c = g.add_child(main, Frame::named("c")).unwrap();
        let d = g.add_child(c, Frame::named("d")).unwrap();
        let mut t = MetricTable::new(["name", "module", "time"]);
        for (node, name, module, time) in [
            (main, "main", "libc", 1.0),
            (a, "a", "app", 2.0),
            (b, "b", "app", 4.0),
            (c, "c", "libm", 8.0),
            (d, "d", "libc", 16.0),
        ] {
            t.insert_row(
                RowKey::node(node),
                vec![Value::from(name), Value::from(module), Value::from(time)],
            )
            .unwrap();
        }
        CallGraphFrame::new(g, t, vec!["time".into()], vec![]).unwrap()
    }

    fn module_of(row: &RowView<'_>) -> String {
        row.text("module").unwrap_or_default().to_string()
    }

    fn super_by_name(frame: &CallGraphFrame, name: &str) -> NodeId {
        frame
            .graph()
            .traverse(TraversalOrder::Pre)
            .find(|&id| frame.graph().frame(id).and_then(Frame::name).as_deref() == Some(name))
            .unwrap()
    }

    #[test]
    fn test_groupby_builds_super_nodes() {
        let grouped = modules()
            .groupby_aggregate(module_of, "module", &ColumnPolicy::default())
            .unwrap();

        assert_eq!(grouped.graph().len(), 3);
        assert_eq!(grouped.table().len(), 3);
        assert!(grouped.is_consistent());

        let libc = super_by_name(&grouped, "libc");
        let app = super_by_name(&grouped, "app");
        let libm = super_by_name(&grouped, "libm");
        assert_eq!(grouped.graph().roots(), &[libc]);
        assert_eq!(grouped.graph().children(libc), &[app, libm]);
        // libm -> libc closes a cycle
        assert_eq!(grouped.graph().children(libm), &[libc]);

        assert_eq!(grouped.table().number(&RowKey::node(libc), "time"), Some(17.0));
        assert_eq!(grouped.table().number(&RowKey::node(app), "time"), Some(6.0));
        assert_eq!(
            grouped.table().get(&RowKey::node(app), "name"),
            Some(&Value::from("app"))
        );
        assert_eq!(
            grouped.graph().frame(app),
            Some(&Frame::with_type("app", "module"))
        );
    }

    #[test]
    fn test_groupby_with_caller_aggregation() {
        let grouped = modules()
            .groupby_aggregate(module_of, "module", &ColumnPolicy::new(AggFn::Max))
            .unwrap();
        let libc = super_by_name(&grouped, "libc");
        assert_eq!(grouped.table().number(&RowKey::node(libc), "time"), Some(16.0));
    }

    #[test]
    fn test_groupby_rows_follow_their_node() {
        // main(rank0 "a", rank1 "a") -> leaf(rank0 "a", rank1 "b")
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let leaf = g.add_child(main, Frame::named("leaf")).unwrap();
        let mut t = MetricTable::with_index_levels(["kind", "time"], ["rank"]);
        for (node, rank, kind, time) in [
            (main, 0, "a", 1.0),
            (main, 1, "a", 2.0),
            (leaf, 0, "a", 4.0),
            (leaf, 1, "b", 8.0),
        ] {
            t.insert_row(
                RowKey::with_secondary(node, vec![rank]),
                vec![Value::from(kind), Value::from(time)],
            )
            .unwrap();
        }
        let frame = CallGraphFrame::new(g, t, vec!["time".into()], vec![]).unwrap();

        let grouped = frame
            .groupby_aggregate(
                |row| row.text("kind").unwrap_or_default().to_string(),
                "kind",
                &ColumnPolicy::default(),
            )
            .unwrap();
        assert!(grouped.is_consistent());
        assert_eq!(grouped.graph().len(), 1);
        assert_eq!(grouped.table().len(), 1);
        let a = grouped.graph().roots()[0];
        assert_eq!(grouped.table().number(&RowKey::node(a), "time"), Some(15.0));
    }

    #[test]
    fn test_groupby_requires_consistent_frame() {
        let mut frame = modules();
        frame.table = frame
            .table()
            .filter_rows(|row| row.text("name") != Some("b"));
        assert!(matches!(
            frame.groupby_aggregate(module_of, "module", &ColumnPolicy::default()),
            Err(FrameError::InvalidConstruction(_))
        ));
    }
}
