//! Aggregations over a call-graph frame.
//!
//! This module provides:
//! - Subtree / subgraph rollups and inclusive metric columns
//! - Group-by into super-nodes
//! - Hot-node ranking and metric distribution statistics

pub mod groupby;
pub mod inclusive;
pub mod metrics;

// Re-export main types and functions
pub use inclusive::Combine;
pub use metrics::{calculate_hot_nodes, calculate_metric_distribution, HotNode, MetricDistribution};
