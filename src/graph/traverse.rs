//! Lazy depth-first traversal over a graph.

use super::graph::Graph;
use super::node::{Node, NodeId};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Dfs, DfsPostOrder, Visitable};

/// Order in which [`Traverse`] yields nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Parents before children (rendering, numbering)
    #[default]
    Pre,
    /// Children before parents (aggregation)
    Post,
}

type VisitMap = <StableDiGraph<Node, ()> as Visitable>::Map;

enum Walk {
    Pre(Dfs<NodeIndex, VisitMap>),
    Post(DfsPostOrder<NodeIndex, VisitMap>),
}

/// Depth-first iterator over the nodes reachable from a set of starts
///
/// Every node is yielded exactly once, even when it is reachable along
/// several paths or through a cycle; the visited set is shared across all
/// starts. Starts missing from the arena are skipped. Children are entered
/// in the order their edges were added.
pub struct Traverse<'g> {
    graph: &'g Graph,
    starts: std::vec::IntoIter<NodeId>,
    walk: Walk,
}

impl<'g> Traverse<'g> {
    pub(crate) fn new(graph: &'g Graph, starts: Vec<NodeId>, order: TraversalOrder) -> Self {
        let arena = graph.arena();
        let walk = match order {
            TraversalOrder::Pre => Walk::Pre(Dfs::empty(arena)),
            TraversalOrder::Post => Walk::Post(DfsPostOrder::empty(arena)),
        };
        Self {
            graph,
            starts: starts.into_iter(),
            walk,
        }
    }
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let arena = self.graph.arena();
        loop {
            let step = match &mut self.walk {
                Walk::Pre(dfs) => dfs.next(arena),
                Walk::Post(dfs) => dfs.next(arena),
            };
            if let Some(ix) = step {
                if let Some(node) = arena.node_weight(ix) {
                    return Some(node.id());
                }
                continue;
            }

            let start = self.starts.next()?;
            if let Some(ix) = self.graph.index_of(start) {
                match &mut self.walk {
                    Walk::Pre(dfs) => dfs.move_to(ix),
                    Walk::Post(dfs) => dfs.move_to(ix),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Frame;

    #[test]
    fn test_cycle_yields_each_node_once() {
        let mut g = Graph::new();
        let a = g.add_root(Frame::named("a"));
        let b = g.add_child(a, Frame::named("b")).unwrap();
        g.add_edge(b, a).unwrap();

        let pre: Vec<NodeId> = g.traverse(TraversalOrder::Pre).collect();
        assert_eq!(pre, vec![a, b]);
        let post: Vec<NodeId> = g.traverse(TraversalOrder::Post).collect();
        assert_eq!(post, vec![b, a]);
    }

    #[test]
    fn test_shared_node_visited_once_across_roots() {
        let mut g = Graph::new();
        let r1 = g.add_root(Frame::named("r1"));
        let r2 = g.add_root(Frame::named("r2"));
        let shared = g.add_child(r1, Frame::named("shared")).unwrap();
        g.add_edge(r2, shared).unwrap();

        let post: Vec<NodeId> = g.traverse(TraversalOrder::Post).collect();
        assert_eq!(post, vec![shared, r1, r2]);
        let from_r2: Vec<NodeId> = g.traverse_from(r2, TraversalOrder::Pre).collect();
        assert_eq!(from_r2, vec![r2, shared]);
    }

    #[test]
    fn test_missing_start_is_skipped() {
        let mut g = Graph::new();
        let a = g.add_root(Frame::named("a"));
        let ghost = NodeId::fresh();
        assert_eq!(g.traverse_from(ghost, TraversalOrder::Pre).count(), 0);
        assert_eq!(g.traverse_from(a, TraversalOrder::Post).count(), 1);
    }
}
