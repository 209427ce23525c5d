//! Output writers for call-graph frames.
//!
//! This module handles writing frames to disk as literal JSON.

pub mod json;

// Re-export main functions
pub use json::{read_document, to_literal, write_literal, LiteralOptions};
