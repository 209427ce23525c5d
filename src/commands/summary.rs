//! Summary command implementation.
//!
//! The summary command:
//! 1. Loads a frame
//! 2. Reports graph shape and declared metrics
//! 3. Ranks hot nodes and prints the metric distribution
//! 4. Folds the metric under each root with the configured combine

use super::utils::load_frame;
use crate::aggregator::{calculate_hot_nodes, calculate_metric_distribution, Combine};
use crate::callgraph::CallGraphFrame;
use crate::table::RowKey;
use crate::utils::config::EngineConfig;
use anyhow::{bail, Result};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the summary command
#[derive(Debug, Clone)]
pub struct SummaryArgs {
    /// Input file (`.json` literal or folded stacks)
    pub input: PathBuf,

    /// Metric to rank by (defaults to the first exclusive metric)
    pub metric: Option<String>,

    /// Number of hot nodes to list
    pub top_nodes: usize,
}

pub fn execute_summary(args: &SummaryArgs, config: &EngineConfig) -> Result<()> {
    let start = Instant::now();
    let frame = load_frame(&args.input, config)?;

    let metric = match &args.metric {
        Some(m) => m.clone(),
        None => match frame.exc_metrics().first() {
            Some(m) => m.clone(),
            None => bail!("{} declares no exclusive metric", args.input.display()),
        },
    };
    if !frame.table().has_column(&metric) {
        bail!("Metric '{}' is not a column of {}", metric, args.input.display());
    }

    let graph = frame.graph();
    println!("Call graph: {}", args.input.display());
    println!("  Nodes: {}", graph.len());
    println!("  Edges: {}", graph.edge_count());
    println!("  Roots: {}", graph.roots().len());
    println!("  Shape: {}", if graph.is_tree() { "tree" } else { "DAG" });
    println!("  Rows: {}", frame.table().len());
    println!("  Exclusive metrics: {}", frame.exc_metrics().join(", "));
    println!("  Inclusive metrics: {}", frame.inc_metrics().join(", "));
    println!();

    let distribution = calculate_metric_distribution(&frame, &metric);
    println!("{} distribution: {}", metric, distribution.summary());
    if distribution.is_highly_concentrated() {
        println!("  (top 10% of nodes hold most of '{}')", metric);
    }
    println!();

    println!("Top {} nodes by {}:", args.top_nodes, metric);
    for (rank, hot) in calculate_hot_nodes(&frame, &metric, args.top_nodes)
        .iter()
        .enumerate()
    {
        println!(
            "  {:>3}. {:>12.3} {:>6.2}%  {}",
            rank + 1,
            hot.value,
            hot.percentage,
            hot.path
        );
    }

    println!();
    println!("{:?} of {} under each root:", config.combine, metric);
    for (name, value) in root_rollups(&frame, &metric, config.combine)? {
        println!("  {:>12.3}  {}", value, name);
    }

    info!("Summary completed in {:.2?}", start.elapsed());
    Ok(())
}

/// Fold `metric` over each root's subgraph, leaving `frame` untouched
fn root_rollups(
    frame: &CallGraphFrame,
    metric: &str,
    combine: Combine,
) -> Result<Vec<(String, f64)>> {
    let out = format!("{} rollup", metric);
    let mut work = frame.copy();
    work.subgraph_sum(
        std::slice::from_ref(&metric.to_string()),
        Some(std::slice::from_ref(&out)),
        combine,
    )?;

    let graph = work.graph();
    Ok(graph
        .roots()
        .iter()
        .map(|&root| {
            let name = graph.frame(root).map(|f| f.to_string()).unwrap_or_default();
            let value = work.table().number(&RowKey::node(root), &out).unwrap_or(0.0);
            (name, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::from_paths;

    #[test]
    fn test_root_rollups_follow_combine() {
        let frame = from_paths(&[&["main", "a", "b"][..], &["main", "c"][..], &["other"][..]])
            .unwrap();

        let sums = root_rollups(&frame, "time", Combine::Sum).unwrap();
        assert_eq!(
            sums,
            vec![("main".to_string(), 4.0), ("other".to_string(), 1.0)]
        );
        let maxes = root_rollups(&frame, "time", Combine::Max).unwrap();
        assert_eq!(maxes[0], ("main".to_string(), 1.0));
        assert!(!frame.table().has_column("time rollup"));
    }
}
