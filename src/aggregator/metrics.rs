//! Hot nodes and metric distribution statistics.
//!
//! Hot nodes are the call-graph nodes with the largest value of one
//! metric. These are the primary targets for optimization.

use crate::callgraph::CallGraphFrame;
use crate::graph::{NodeId, TraversalOrder};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of a hot-node report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotNode {
    /// Call path from a root, frames joined by `;`
    pub path: String,

    #[serde(skip)]
    pub node: Option<NodeId>,

    /// Metric value summed over the node's rows
    pub value: f64,

    /// Share of the metric total
    pub percentage: f64,
}

/// Per-node totals of `metric` in traversal order
///
/// **Private** - rows of the same node (different secondary keys) are summed
fn node_totals(frame: &CallGraphFrame, metric: &str) -> Vec<(NodeId, f64)> {
    let mut totals: HashMap<NodeId, f64> = HashMap::new();
    for row in frame.table().rows() {
        if let Some(v) = row.number(metric) {
            *totals.entry(row.node()).or_default() += v;
        }
    }
    frame
        .graph()
        .traverse(TraversalOrder::Pre)
        .filter_map(|id| totals.get(&id).map(|&v| (id, v)))
        .collect()
}

/// Rank nodes by `metric`
///
/// **Public** - main entry point for hot-node reporting
///
/// # Arguments
/// * `frame` - Frame to inspect
/// * `metric` - Column to rank by (usually exclusive)
/// * `top_n` - Number of nodes to return
///
/// # Returns
/// Hot nodes sorted by value (descending); ties keep traversal order
pub fn calculate_hot_nodes(frame: &CallGraphFrame, metric: &str, top_n: usize) -> Vec<HotNode> {
    let mut totals = node_totals(frame, metric);
    let total: f64 = totals.iter().map(|(_, v)| v).sum();
    debug!(
        "Calculating top {} hot nodes by '{}' from {} nodes",
        top_n,
        metric,
        totals.len()
    );

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
        .into_iter()
        .take(top_n)
        .map(|(node, value)| create_hot_node(frame, node, value, total))
        .collect()
}

/// **Private** - internal conversion
fn create_hot_node(frame: &CallGraphFrame, node: NodeId, value: f64, total: f64) -> HotNode {
    let graph = frame.graph();
    let path = graph
        .path(node)
        .into_iter()
        .filter_map(|id| graph.frame(id).map(|f| f.to_string()))
        .collect::<Vec<_>>()
        .join(";");

    let percentage = if total > 0.0 {
        (value / total) * 100.0
    } else {
        0.0
    };

    HotNode {
        path,
        node: Some(node),
        value,
        percentage,
    }
}

/// Calculate how `metric` is spread over the nodes
pub fn calculate_metric_distribution(frame: &CallGraphFrame, metric: &str) -> MetricDistribution {
    let mut values: Vec<f64> = node_totals(frame, metric)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    if values.is_empty() {
        return MetricDistribution::default();
    }

    values.sort_by(|a, b| b.total_cmp(a));
    let total: f64 = values.iter().sum();
    let count = values.len();
    let mean = total / count as f64;
    let median = values[count / 2];

    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent: f64 = values.iter().take(top_10_percent_count).sum();

    MetricDistribution {
        total,
        node_count: count,
        mean,
        median,
        top_10_percent,
        top_10_percent_percentage: if total > 0.0 {
            (top_10_percent / total) * 100.0
        } else {
            0.0
        },
    }
}

/// Metric distribution statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDistribution {
    /// Sum over all nodes
    pub total: f64,

    /// Nodes with a numeric value
    pub node_count: usize,

    pub mean: f64,

    pub median: f64,

    /// Value held by the top 10% of nodes
    pub top_10_percent: f64,

    /// Share of the total held by the top 10% of nodes
    pub top_10_percent_percentage: f64,
}

impl MetricDistribution {
    /// True if the top 10% of nodes hold more than 80% of the total
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and the `summary` command
    pub fn summary(&self) -> String {
        format!(
            "Total: {:.3} | Nodes: {} | Mean: {:.3} | Median: {:.3} | Top 10%: {:.1}%",
            self.total, self.node_count, self.mean, self.median, self.top_10_percent_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Frame, Graph};
    use crate::table::{MetricTable, RowKey, Value};

    fn frame(weights: &[(&str, f64)]) -> CallGraphFrame {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let mut t = MetricTable::new(["gas"]);
        t.insert_row(RowKey::node(main), vec![Value::zero()]).unwrap();
        for &(name, w) in weights {
            let child = g.add_child(main, Frame::named(name)).unwrap();
            t.insert_row(RowKey::node(child), vec![Value::from(w)]).unwrap();
        }
        CallGraphFrame::new(g, t, vec!["gas".into()], vec![]).unwrap()
    }

    #[test]
    fn test_calculate_hot_nodes() {
        let f = frame(&[("execute", 5000.0), ("storage", 3000.0), ("compute", 2000.0)]);
        let hot = calculate_hot_nodes(&f, "gas", 2);

        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].path, "main;execute");
        assert_eq!(hot[0].value, 5000.0);
        assert_eq!(hot[0].percentage, 50.0);
        assert_eq!(hot[1].path, "main;storage");
    }

    #[test]
    fn test_calculate_metric_distribution() {
        let f = frame(&[("a", 9000.0), ("b", 500.0), ("c", 250.0), ("d", 250.0)]);
        let dist = calculate_metric_distribution(&f, "gas");

        assert_eq!(dist.total, 10000.0);
        assert_eq!(dist.node_count, 5);
        assert_eq!(dist.mean, 2000.0);
        assert!(dist.is_highly_concentrated());
        assert!(dist.summary().contains("Nodes: 5"));
    }

    #[test]
    fn test_distribution_unknown_metric() {
        let f = frame(&[("a", 1.0)]);
        let dist = calculate_metric_distribution(&f, "cycles");
        assert_eq!(dist, MetricDistribution::default());
    }
}
