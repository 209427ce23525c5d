//! Callframe Studio CLI
//!
//! Loads call-graph profiles and runs the frame algebra on them:
//! summaries, filter-and-squash, arithmetic between profiles and group-by.

use anyhow::{Context, Result};
use callframe_studio::callgraph::ArithOp;
use callframe_studio::commands::{
    display_schema, display_version, execute_combine, execute_filter, execute_groupby,
    execute_summary, validate_literal_file, CombineArgs, FilterArgs, GroupbyArgs, SummaryArgs,
};
use callframe_studio::utils::config::{load_config, EngineConfig};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

/// Callframe Studio - call-graph algebra for performance profiles
#[derive(Parser, Debug)]
#[command(name = "callframe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration (TOML)
    #[arg(short, long, global = true, env = "CALLFRAME_CONFIG")]
    config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print graph shape, metric distribution and hot nodes
    Summary {
        /// Input file (.json literal graph, anything else folded stacks)
        input: PathBuf,

        /// Metric to rank nodes by
        #[arg(short, long)]
        metric: Option<String>,

        /// Number of hot nodes to list
        #[arg(long, default_value = "10")]
        top_nodes: usize,
    },

    /// Keep matching nodes and squash the graph around them
    Filter {
        input: PathBuf,

        /// Output path for the literal JSON result
        #[arg(short, long, default_value = "filtered.json")]
        output: PathBuf,

        /// Call-path pattern, e.g. "main/**/solve"
        #[arg(long)]
        path: Option<String>,

        /// Keep rows with METRIC >= VALUE, e.g. "time=0.5"
        #[arg(long)]
        min: Option<String>,

        /// Do not squash the graph after filtering
        #[arg(long)]
        no_squash: bool,
    },

    /// Combine two profiles element-wise
    Combine {
        left: PathBuf,
        right: PathBuf,

        /// add, sub, mul or div
        #[arg(long, default_value = "add")]
        op: ArithOp,

        #[arg(short, long, default_value = "combined.json")]
        output: PathBuf,
    },

    /// Collapse nodes into super-nodes by a column value
    Groupby {
        input: PathBuf,

        /// Column to group by
        #[arg(short, long, default_value = "name")]
        column: String,

        #[arg(short, long, default_value = "grouped.json")]
        output: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,

        /// Validate a literal JSON file against the schema
        #[arg(long)]
        validate: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    debug!("Engine config: {:?}", config);

    match cli.command {
        Commands::Summary {
            input,
            metric,
            top_nodes,
        } => {
            execute_summary(
                &SummaryArgs {
                    input,
                    metric,
                    top_nodes,
                },
                &config,
            )?;
        }

        Commands::Filter {
            input,
            output,
            path,
            min,
            no_squash,
        } => {
            execute_filter(
                &FilterArgs {
                    input,
                    output,
                    path,
                    min,
                    no_squash,
                },
                &config,
            )?;
        }

        Commands::Combine {
            left,
            right,
            op,
            output,
        } => {
            execute_combine(
                &CombineArgs {
                    left,
                    right,
                    op,
                    output,
                },
                &config,
            )?;
        }

        Commands::Groupby {
            input,
            column,
            output,
        } => {
            execute_groupby(
                &GroupbyArgs {
                    input,
                    column,
                    output,
                },
                &config,
            )?;
        }

        Commands::Schema { show, validate } => match validate {
            Some(file) => validate_literal_file(&file)?,
            None => display_schema(show),
        },

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
