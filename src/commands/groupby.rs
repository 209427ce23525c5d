use super::utils::load_frame;
use crate::output::{write_literal, LiteralOptions};
use crate::utils::config::EngineConfig;
use anyhow::{bail, Result};
use log::info;
use std::path::PathBuf;

/// Arguments for the groupby command
#[derive(Debug, Clone)]
pub struct GroupbyArgs {
    pub input: PathBuf,

    /// Column whose value names each group
    pub column: String,

    pub output: PathBuf,
}

/// Collapse nodes sharing a column value into super-nodes
pub fn execute_groupby(args: &GroupbyArgs, config: &EngineConfig) -> Result<()> {
    let frame = load_frame(&args.input, config)?;
    if !frame.table().has_column(&args.column) {
        bail!(
            "Column '{}' is not present in {}",
            args.column,
            args.input.display()
        );
    }

    let column = args.column.clone();
    let mut grouped = frame.groupby_aggregate(
        move |row| row.get(&column).map(|v| v.to_string()).unwrap_or_default(),
        &args.column,
        &config.groupby,
    )?;
    grouped.update_inclusive_columns()?;

    info!(
        "Grouped {} nodes into {} super-nodes",
        frame.graph().len(),
        grouped.graph().len()
    );
    write_literal(&grouped, &LiteralOptions::default(), &args.output)?;
    println!("✓ Grouped graph written to {}", args.output.display());
    Ok(())
}
