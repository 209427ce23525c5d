//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::graph::NodeId;
use thiserror::Error;

/// Errors raised by graph construction and whole-graph rewrites
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found in graph: {0}")]
    NodeNotFound(NodeId),

    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),
}

/// Errors raised by the metric table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Row has {actual} values but the table has {expected} columns")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Column already exists: {0}")]
    DuplicateColumn(String),

    #[error("Row key has {actual} secondary values but the table declares {expected} index levels")]
    IndexLevelMismatch { expected: usize, actual: usize },
}

/// Errors raised by call-graph frame operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Invalid call-graph frame: {0}")]
    InvalidConstruction(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("The provided filter would have produced an empty call-graph frame")]
    EmptyFilter,

    #[error("Cannot squash a call-graph frame with no rows")]
    EmptySquash,

    #[error("Columns and output columns must be the same length ({columns} vs {out_columns})")]
    ColumnLengthMismatch { columns: usize, out_columns: usize },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Errors that can occur while importing profile data
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid input format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Imported data is inconsistent: {0}")]
    Frame(#[from] FrameError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
