//! Callframe Studio
//!
//! An algebra over call graphs paired with per-node metric tables:
//! union, squash, unify, group-by, subtree/subgraph sums and element-wise
//! arithmetic between profiles, all keeping graph and table consistent.
//!
//! This crate provides the core implementation for the
//! `callframe` CLI tool.
//!
//! ## Getting Started
//!
//! ```ignore
//! use callframe_studio::parser::from_paths;
//! use callframe_studio::query::Filter;
//! use callframe_studio::callgraph::SquashOptions;
//!
//! let frame = from_paths(&[&["main", "solve"][..], &["main", "io"][..]])?;
//! let solve = frame.filter_squash(&Filter::path("main/solve"), &SquashOptions::default())?;
//! ```

pub mod aggregator;
pub mod callgraph;
pub mod commands;
pub mod graph;
pub mod output;
pub mod parser;
pub mod query;
pub mod table;
pub mod utils;

pub use callgraph::CallGraphFrame;
