//! Importer for folded (collapsed) stacks and plain call-path lists.
//!
//! Folded stacks are one sample per line: `main;solve;mpi_wait 42`.

use crate::callgraph::CallGraphFrame;
use crate::graph::{Frame, Graph, NodeId, TraversalOrder};
use crate::table::{MetricTable, RowKey, Value};
use crate::utils::config::{DEFAULT_PATH_METRIC, NAME_COLUMN};
use crate::utils::error::{FrameError, GraphError, ParseError};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Child of `parent` (or root, for `None`) with `frame`, created if missing
fn child_by_frame(
    graph: &mut Graph,
    parent: Option<NodeId>,
    frame: Frame,
) -> Result<NodeId, GraphError> {
    let siblings = match parent {
        Some(p) => graph.children(p),
        None => graph.roots().to_vec(),
    };
    if let Some(&existing) = siblings
        .iter()
        .find(|&&id| graph.frame(id) == Some(&frame))
    {
        return Ok(existing);
    }
    match parent {
        Some(p) => graph.add_child(p, frame),
        None => Ok(graph.add_root(frame)),
    }
}

/// Frame with one row per node: `name` and `metric` from `weights`
fn tree_frame(
    mut graph: Graph,
    weights: &HashMap<NodeId, f64>,
    metric: &str,
) -> Result<CallGraphFrame, ParseError> {
    graph.enumerate_traverse();
    let mut table = MetricTable::new([NAME_COLUMN, metric]);
    for id in graph.traverse(TraversalOrder::Pre) {
        let name = graph.frame(id).map(|f| f.to_string()).unwrap_or_default();
        let weight = weights.get(&id).copied().unwrap_or(0.0);
        table
            .insert_row(RowKey::node(id), vec![Value::from(name), Value::from(weight)])
            .map_err(FrameError::from)?;
    }
    let mut frame = CallGraphFrame::new(graph, table, vec![metric.to_string()], vec![])?;
    frame.update_inclusive_columns()?;
    Ok(frame)
}

/// Parse folded stacks into a call tree
///
/// **Public** - main entry point for folded input
///
/// # Arguments
/// * `input` - Folded stack text; blank lines and `#` comments are skipped
/// * `metric` - Exclusive metric receiving each line's weight
///
/// # Returns
/// A tree frame; each line's weight lands on its leaf frame, repeated
/// stacks accumulate.
///
/// # Errors
/// * `ParseError::InvalidFormat` - A line has no weight, a bad weight or
///   an empty frame, or no stacks were found
pub fn parse_folded(input: &str, metric: &str) -> Result<CallGraphFrame, ParseError> {
    let mut graph = Graph::new();
    let mut weights: HashMap<NodeId, f64> = HashMap::new();
    let mut stacks = 0usize;

    for (idx, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = idx + 1;

        let (stack, weight) = line.rsplit_once(char::is_whitespace).ok_or_else(|| {
            ParseError::InvalidFormat(format!("line {}: expected '<stack> <weight>'", lineno))
        })?;
        let weight: f64 = weight.parse().map_err(|_| {
            ParseError::InvalidFormat(format!("line {}: invalid weight '{}'", lineno, weight))
        })?;
        if weight < 0.0 {
            warn!("line {}: negative weight {}", lineno, weight);
        }

        let mut current: Option<NodeId> = None;
        for name in stack.trim().split(';') {
            if name.is_empty() {
                return Err(ParseError::InvalidFormat(format!(
                    "line {}: empty frame in stack '{}'",
                    lineno,
                    stack.trim()
                )));
            }
            let id = child_by_frame(&mut graph, current, Frame::named(name))
                .map_err(FrameError::from)?;
            current = Some(id);
        }
        if let Some(leaf) = current {
            *weights.entry(leaf).or_default() += weight;
            stacks += 1;
        }
    }

    if stacks == 0 {
        return Err(ParseError::InvalidFormat("no stacks found".to_string()));
    }
    debug!("Parsed {} folded stacks into {} nodes", stacks, graph.len());
    tree_frame(graph, &weights, metric)
}

/// Read a folded-stack file
pub fn read_folded(path: impl AsRef<Path>, metric: &str) -> Result<CallGraphFrame, ParseError> {
    let path = path.as_ref();
    debug!("Reading folded stacks from: {}", path.display());
    let contents = fs::read_to_string(path)?;
    parse_folded(&contents, metric)
}

/// Build a tree frame from call paths, each node weighing `1.0`
///
/// Paths sharing a prefix share nodes. Every node gets an exclusive
/// `time` of 1 and inclusive `time (inc)` computed over the tree.
pub fn from_paths(paths: &[&[&str]]) -> Result<CallGraphFrame, ParseError> {
    let mut graph = Graph::new();
    for path in paths {
        let mut current: Option<NodeId> = None;
        for &name in path.iter() {
            let id = child_by_frame(&mut graph, current, Frame::named(name))
                .map_err(FrameError::from)?;
            current = Some(id);
        }
    }
    if graph.is_empty() {
        return Err(ParseError::InvalidFormat("no call paths given".to_string()));
    }

    let weights: HashMap<NodeId, f64> = graph
        .traverse(TraversalOrder::Pre)
        .map(|id| (id, 1.0))
        .collect();
    tree_frame(graph, &weights, DEFAULT_PATH_METRIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::DEFAULT_FOLDED_METRIC;

    fn inclusive_of(frame: &CallGraphFrame, name: &str, metric: &str) -> Option<f64> {
        frame
            .table()
            .rows()
            .find(|r| r.text("name") == Some(name))
            .and_then(|r| r.number(metric))
    }

    #[test]
    fn test_parse_folded_merges_prefixes() {
        let input = "\
# sampled
main;solve;mpi_wait 3
main;solve 2

main;io 5
main;solve;mpi_wait 1
";
        let frame = parse_folded(input, DEFAULT_FOLDED_METRIC).unwrap();
        assert_eq!(frame.graph().len(), 4);
        assert!(frame.graph().is_tree());
        assert_eq!(inclusive_of(&frame, "mpi_wait", "samples"), Some(4.0));
        assert_eq!(inclusive_of(&frame, "solve", "samples (inc)"), Some(6.0));
        assert_eq!(inclusive_of(&frame, "main", "samples (inc)"), Some(11.0));
        assert_eq!(inclusive_of(&frame, "main", "samples"), Some(0.0));
    }

    #[test]
    fn test_parse_folded_errors() {
        for bad in ["main;solve", "main;solve abc", "main;;solve 1", "# only a comment"] {
            assert!(
                matches!(parse_folded(bad, "samples"), Err(ParseError::InvalidFormat(_))),
                "{:?} should fail",
                bad
            );
        }
    }

    #[test]
    fn test_from_paths() {
        let frame = from_paths(&[&["main", "a", "b"][..], &["main", "c"][..]]).unwrap();
        assert_eq!(frame.graph().len(), 4);
        assert_eq!(inclusive_of(&frame, "main", "time (inc)"), Some(4.0));
        assert_eq!(inclusive_of(&frame, "a", "time (inc)"), Some(2.0));
        assert!(from_paths(&[]).is_err());
    }
}
