//! Call-graph data structures.
//!
//! This module provides:
//! - Frames (structural identity keys)
//! - Nodes with process-unique identities, stored in a petgraph arena
//! - Graphs with lazy traversal, copy, union, normalization and restriction

pub mod frame;
#[allow(clippy::module_inception)]
pub mod graph;
pub mod node;
pub mod traverse;

mod normalize;
mod restrict;
mod union;

// Re-export main types
pub use frame::{Frame, FrameFloat, FrameValue};
pub use graph::Graph;
pub use node::{Node, NodeId};
pub use traverse::{TraversalOrder, Traverse};
