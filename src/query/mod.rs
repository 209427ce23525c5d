//! Node selection for filtering.
//!
//! A [`Filter`] is either a row predicate, a call-path pattern, or any
//! custom [`NodeMatcher`]. All three are evaluated through
//! [`Filter::select`], which yields the row keys to keep.

pub mod path;

pub use path::{PathPattern, PathSegment};

use crate::graph::{Graph, NodeId};
use crate::table::{MetricTable, RowKey, RowView};
use crate::utils::error::FrameError;
use std::collections::HashSet;
use std::fmt;

/// Finds call paths in a graph
pub trait NodeMatcher {
    /// Every matching downward call path, as node sequences
    fn matches(&self, graph: &Graph) -> Vec<Vec<NodeId>>;
}

pub type RowPredicate = Box<dyn Fn(&RowView<'_>) -> bool>;

/// What to keep when filtering a frame
pub enum Filter {
    /// Keep rows for which the predicate holds
    Predicate(RowPredicate),
    /// Keep every row of every node on a path matching this pattern source
    Path(String),
    /// Keep every row of every node on a path found by the matcher
    Query(Box<dyn NodeMatcher>),
}

impl Filter {
    pub fn predicate(f: impl Fn(&RowView<'_>) -> bool + 'static) -> Self {
        Filter::Predicate(Box::new(f))
    }

    pub fn path(pattern: impl Into<String>) -> Self {
        Filter::Path(pattern.into())
    }

    pub fn query(matcher: impl NodeMatcher + 'static) -> Self {
        Filter::Query(Box::new(matcher))
    }

    /// Row keys of `table` retained by this filter
    ///
    /// # Errors
    /// * `FrameError::InvalidFilter` - the path pattern does not parse
    pub fn select(
        &self,
        graph: &Graph,
        table: &MetricTable,
    ) -> Result<HashSet<RowKey>, FrameError> {
        let matched_nodes = |paths: Vec<Vec<NodeId>>| -> HashSet<NodeId> {
            paths.into_iter().flatten().collect()
        };

        let keep: HashSet<NodeId> = match self {
            Filter::Predicate(pred) => {
                return Ok(table
                    .rows()
                    .filter(|row| pred(row))
                    .map(|row| row.key().clone())
                    .collect());
            }
            Filter::Path(source) => matched_nodes(PathPattern::parse(source)?.matches(graph)),
            Filter::Query(matcher) => matched_nodes(matcher.matches(graph)),
        };

        Ok(table
            .keys()
            .filter(|key| keep.contains(&key.node))
            .cloned()
            .collect())
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Predicate(_) => f.write_str("Filter::Predicate(..)"),
            Filter::Path(source) => f.debug_tuple("Filter::Path").field(source).finish(),
            Filter::Query(_) => f.write_str("Filter::Query(..)"),
        }
    }
}
