//! Call-path patterns such as `main/**/solve`.

use super::NodeMatcher;
use crate::graph::{FrameValue, Graph, NodeId, TraversalOrder};
use crate::utils::error::FrameError;
use indexmap::IndexSet;
use std::fmt;

/// One `/`-separated piece of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Exactly one node whose `name` attribute equals this
    Name(String),
    /// `*`: exactly one node of any name
    AnyOne,
    /// `**`: zero or more nodes
    AnyMany,
}

/// Compiled call-path pattern
///
/// Matches any contiguous downward path in the graph, starting at any node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PathSegment>,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self, FrameError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(FrameError::InvalidFilter("empty path pattern".to_string()));
        }

        let segments = source
            .split('/')
            .map(|seg| match seg.trim() {
                "" => Err(FrameError::InvalidFilter(format!(
                    "empty segment in path pattern '{}'",
                    source
                ))),
                "*" => Ok(PathSegment::AnyOne),
                "**" => Ok(PathSegment::AnyMany),
                name => Ok(PathSegment::Name(name.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if segments.iter().all(|s| *s == PathSegment::AnyMany) {
            return Err(FrameError::InvalidFilter(format!(
                "path pattern '{}' matches nothing in particular",
                source
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True when every segment from `idx` on can match zero nodes
    fn only_any_many_from(&self, idx: usize) -> bool {
        self.segments
            .get(idx..)
            .map_or(true, |rest| rest.iter().all(|s| *s == PathSegment::AnyMany))
    }
}

fn has_name(graph: &Graph, node: NodeId, name: &str) -> bool {
    matches!(
        graph.frame(node).and_then(|f| f.get("name")),
        Some(FrameValue::Str(s)) if s == name
    )
}

impl NodeMatcher for PathPattern {
    fn matches(&self, graph: &Graph) -> Vec<Vec<NodeId>> {
        let last = self.segments.len();
        let mut found: IndexSet<Vec<NodeId>> = IndexSet::new();

        for start in graph.traverse(TraversalOrder::Pre) {
            // (candidate node, segment to match against it, path so far)
            let mut stack: Vec<(NodeId, usize, Vec<NodeId>)> = vec![(start, 0, Vec::new())];

            while let Some((node, seg, path)) = stack.pop() {
                // cycle guard for graphs rebuilt by group-by
                if path.contains(&node) {
                    continue;
                }
                let next = match &self.segments[seg] {
                    PathSegment::AnyMany => {
                        if seg + 1 < last {
                            stack.push((node, seg + 1, path.clone()));
                        }
                        seg
                    }
                    PathSegment::AnyOne => seg + 1,
                    PathSegment::Name(name) => {
                        if !has_name(graph, node, name) {
                            continue;
                        }
                        seg + 1
                    }
                };

                let mut extended = path;
                extended.push(node);
                if self.only_any_many_from(seg + 1) {
                    found.insert(extended.clone());
                }
                if next < last {
                    for child in graph.children(node) {
                        stack.push((child, next, extended.clone()));
                    }
                }
            }
        }
        found.into_iter().collect()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                PathSegment::Name(n) => n.as_str(),
                PathSegment::AnyOne => "*",
                PathSegment::AnyMany => "**",
            })
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}
