//! Importers producing call-graph frames.
//!
//! This module handles:
//! - The literal JSON form (nested nodes with metrics)
//! - Folded stacks (`a;b;c weight`)
//! - Plain call-path lists, mostly for tests

pub mod folded;
pub mod literal;
pub mod schema;

// Re-export main types
pub use folded::{from_paths, parse_folded, read_folded};
pub use literal::{from_literal, parse_literal, read_literal};
pub use schema::{LiteralDocument, LiteralInput, LiteralNode};
