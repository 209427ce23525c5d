use crate::callgraph::CallGraphFrame;
use crate::output::read_document;
use crate::parser::{read_folded, read_literal};
use crate::utils::config::{EngineConfig, SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

/// Load a frame, choosing the importer by file extension
///
/// `.json` files are read as literal graphs; anything else as folded stacks.
pub fn load_frame(path: &Path, config: &EngineConfig) -> Result<CallGraphFrame> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    debug!(
        "Loading {} as {}",
        path.display(),
        if is_json { "literal JSON" } else { "folded stacks" }
    );

    let frame = if is_json {
        read_literal(path)
    } else {
        read_folded(path, &config.folded_metric)
    }
    .with_context(|| format!("Failed to load call graph from {}", path.display()))?;
    Ok(frame)
}

/// Validate a literal JSON file
pub fn validate_literal_file(file_path: &Path) -> Result<()> {
    println!("Validating literal graph: {}", file_path.display());

    let document = read_document(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;
    let frame = read_literal(file_path)?;

    println!("✓ Valid literal JSON");
    println!("  Version: {}", document.version);
    println!("  Generated: {}", document.generated_at);
    println!("  Roots: {}", document.graph.len());
    println!("  Nodes: {}", frame.graph().len());
    println!("  Metrics: {}", frame.metric_columns().join(", "));

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Callframe Studio Literal Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string     - ISO 8601 timestamp");
        println!("  graph: array             - Root nodes in order");
        println!("    name: string           - Display name");
        println!("    frame: object?         - Frame attributes (defaults to {{name}})");
        println!("    metrics: object        - Metric name -> number");
        println!("                             names containing '(inc)' are inclusive");
        println!("    children: array?       - Child nodes, same shape");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Callframe Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Literal Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Call-graph algebra for hierarchical performance profiles.");
}
