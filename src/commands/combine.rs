use super::utils::load_frame;
use crate::callgraph::ArithOp;
use crate::output::{write_literal, LiteralOptions};
use crate::utils::config::EngineConfig;
use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

/// Arguments for the combine command
#[derive(Debug, Clone)]
pub struct CombineArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub op: ArithOp,
    pub output: PathBuf,
}

/// Unify two graphs and combine their metrics element-wise
pub fn execute_combine(args: &CombineArgs, config: &EngineConfig) -> Result<()> {
    let left = load_frame(&args.left, config)?;
    let right = load_frame(&args.right, config)?;

    let result = left.combine(&right, args.op).with_context(|| {
        format!(
            "Failed to compute {} {} {}",
            args.left.display(),
            args.op,
            args.right.display()
        )
    })?;

    info!(
        "Combined graph has {} nodes ({} + {})",
        result.graph().len(),
        left.graph().len(),
        right.graph().len()
    );
    write_literal(&result, &LiteralOptions::default(), &args.output)?;
    println!("✓ Combined graph written to {}", args.output.display());
    Ok(())
}
