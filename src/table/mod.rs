//! Metric table keyed by graph node.
//!
//! A small associative table with the operations the call-graph algebra
//! needs (keyed lookup, filtering, re-keying with
//! collision aggregation, group-by, zero-filled row insertion).

#[allow(clippy::module_inception)]
pub mod table;
pub mod value;

// Re-export main types
pub use table::{MetricTable, RowKey, RowView};
pub use value::{AggFn, ColumnPolicy, Value};
