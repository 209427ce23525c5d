//! Literal JSON output writer.
//!
//! Converts frames to the literal form and writes them with proper
//! formatting.

use crate::callgraph::CallGraphFrame;
use crate::graph::{Frame, Graph, NodeId};
use crate::parser::schema::{LiteralDocument, LiteralNode};
use crate::table::RowKey;
use crate::utils::config::{NAME_COLUMN, SCHEMA_VERSION};
use crate::utils::error::OutputError;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Which rows end up in the literal form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOptions {
    /// Column holding each node's display name
    pub name_column: String,

    /// Secondary key to export when the table has index levels
    pub secondary: Vec<i64>,
}

impl Default for LiteralOptions {
    fn default() -> Self {
        Self {
            name_column: NAME_COLUMN.to_string(),
            secondary: Vec::new(),
        }
    }
}

/// Convert a frame to the literal form
///
/// **Public** - main entry point for literal output
///
/// Roots keep their order; children are sorted by frame. A node reached
/// again through a cycle is not expanded a second time on the same path.
pub fn to_literal(frame: &CallGraphFrame, options: &LiteralOptions) -> LiteralDocument {
    let metrics = frame.metric_columns();
    let graph = frame.graph();
    let mut on_path = Vec::new();
    let roots = graph
        .roots()
        .iter()
        .map(|&root| literal_node(frame, graph, root, &metrics, options, &mut on_path))
        .collect();

    LiteralDocument {
        version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        graph: roots,
    }
}

/// **Private** - one node and its descendants
fn literal_node(
    frame: &CallGraphFrame,
    graph: &Graph,
    id: NodeId,
    metrics: &[String],
    options: &LiteralOptions,
    on_path: &mut Vec<NodeId>,
) -> LiteralNode {
    let node_frame = graph.frame(id).cloned().unwrap_or_default();
    let key = RowKey::with_secondary(id, options.secondary.clone());
    let row = frame.table().row(&key);

    let name = row
        .and_then(|r| r.text(&options.name_column).map(str::to_string))
        .or_else(|| node_frame.name())
        .unwrap_or_else(|| node_frame.to_string());

    let metric_values: BTreeMap<String, f64> = row
        .map(|r| {
            metrics
                .iter()
                .filter_map(|m| r.number(m).map(|v| (m.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    on_path.push(id);
    let mut children: Vec<NodeId> = graph
        .children(id)
        .into_iter()
        .filter(|c| !on_path.contains(c))
        .collect();
    children.sort_by(|a, b| graph.frame(*a).cmp(&graph.frame(*b)));
    let children = children
        .into_iter()
        .map(|c| literal_node(frame, graph, c, metrics, options, on_path))
        .collect();
    on_path.pop();

    let explicit_frame = (node_frame != Frame::named(name.clone())).then_some(node_frame);
    LiteralNode {
        name,
        frame: explicit_frame,
        metrics: metric_values,
        children,
    }
}

/// Write a frame as literal JSON
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// write_literal(&frame, &LiteralOptions::default(), "graph.json")?;
/// ```
pub fn write_literal(
    frame: &CallGraphFrame,
    options: &LiteralOptions,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing literal graph to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &to_literal(frame, options))
        .map_err(OutputError::SerializationFailed)?;

    info!(
        "Literal graph written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a literal document without building a frame
///
/// **Public** - used by the `schema --validate` command and tests
pub fn read_document(input_path: impl AsRef<Path>) -> Result<LiteralDocument, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading literal document from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let document: LiteralDocument =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Literal document loaded: version {}, {} roots",
        document.version,
        document.graph.len()
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{from_paths, read_literal};
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    #[test]
    fn test_to_literal_sorts_children() {
        let frame = from_paths(&[&["main", "zeta"][..], &["main", "alpha"][..]]).unwrap();
        let doc = to_literal(&frame, &LiteralOptions::default());

        assert_eq!(doc.version, SCHEMA_VERSION);
        assert_eq!(doc.graph.len(), 1);
        let names: Vec<&str> = doc.graph[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(doc.graph[0].metrics.get("time (inc)"), Some(&3.0));
        assert!(doc.graph[0].frame.is_none());
    }

    #[test]
    fn test_write_and_read_back() {
        let frame = from_paths(&[&["main", "a", "b"][..], &["main", "c"][..]]).unwrap();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_literal(&frame, &LiteralOptions::default(), path).unwrap();

        let doc = read_document(path).unwrap();
        assert_eq!(doc.graph.len(), 1);

        let loaded = read_literal(path).unwrap();
        assert_eq!(loaded.graph().len(), frame.graph().len());
        assert_eq!(loaded.graph().edge_count(), frame.graph().edge_count());
        assert_eq!(loaded.exc_metrics(), frame.exc_metrics());
    }

    #[test]
    fn test_validate_output_path_empty() {
        let result = validate_output_path(Path::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = validate_output_path(temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/graph.json");

        let frame = from_paths(&[&["main"][..]]).unwrap();
        write_literal(&frame, &LiteralOptions::default(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
