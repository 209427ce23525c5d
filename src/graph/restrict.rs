//! Restricting a graph to a node subset while keeping ancestry.

use super::graph::Graph;
use super::node::NodeId;
use super::traverse::TraversalOrder;
use crate::utils::error::GraphError;
use indexmap::IndexSet;
use log::debug;
use std::collections::{HashMap, HashSet};

impl Graph {
    /// Build a new graph containing only `retained` nodes
    ///
    /// Every retained node gets a fresh copy (same frame and nid). A copied
    /// node is linked under the copy of each nearest retained ancestor, or
    /// becomes a root when some path from a root reaches it without passing
    /// another retained node. Removed nodes are elided, so a tree may come
    /// out as a DAG.
    ///
    /// Returns the new graph and old id -> new id for the retained nodes.
    pub fn restrict(
        &self,
        retained: &HashSet<NodeId>,
    ) -> Result<(Graph, HashMap<NodeId, NodeId>), GraphError> {
        self.check_arena()?;

        let mut restricted = Graph::new();
        let mut old_to_new: HashMap<NodeId, NodeId> = HashMap::new();
        for id in self.traverse(TraversalOrder::Pre) {
            if retained.contains(&id) {
                let node = self.node(id).ok_or(GraphError::NodeNotFound(id))?;
                old_to_new.insert(id, restricted.insert_node(node.copy()));
            }
        }

        // Frontier of an old node: the new nodes its nearest retained
        // ancestor should adopt. Postorder fills children before parents.
        let mut frontier: HashMap<NodeId, IndexSet<NodeId>> = HashMap::new();
        for id in self.traverse(TraversalOrder::Post) {
            let reach = match old_to_new.get(&id) {
                Some(&new_id) => IndexSet::from([new_id]),
                None => {
                    let mut acc = IndexSet::new();
                    for child in self.children(id) {
                        if let Some(child_reach) = frontier.get(&child) {
                            acc.extend(child_reach.iter().copied());
                        }
                    }
                    acc
                }
            };
            frontier.insert(id, reach);
        }

        for id in self.traverse(TraversalOrder::Pre) {
            let Some(&new_parent) = old_to_new.get(&id) else {
                continue;
            };
            for child in self.children(id) {
                if let Some(reach) = frontier.get(&child) {
                    for &new_child in reach {
                        if new_child != new_parent {
                            restricted.add_edge(new_parent, new_child)?;
                        }
                    }
                }
            }
        }

        for root in self.roots() {
            if let Some(reach) = frontier.get(root) {
                for &new_root in reach {
                    restricted.push_root(new_root)?;
                }
            }
        }

        debug!(
            "Restricted graph from {} to {} nodes ({} edges)",
            frontier.len(),
            old_to_new.len(),
            restricted.edge_count()
        );
        Ok((restricted, old_to_new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Frame;

    #[test]
    fn test_restrict_relinks_around_removed_nodes() {
        // main -> wrapper -> (a, b)
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let wrapper = g.add_child(main, Frame::named("wrapper")).unwrap();
        let a = g.add_child(wrapper, Frame::named("a")).unwrap();
        let b = g.add_child(wrapper, Frame::named("b")).unwrap();

        let keep = HashSet::from([main, a, b]);
        let (r, map) = g.restrict(&keep).unwrap();

        assert_eq!(r.len(), 3);
        assert_eq!(r.children(map[&main]), &[map[&a], map[&b]]);
        assert!(!map.contains_key(&wrapper));
    }

    #[test]
    fn test_restrict_promotes_orphans_to_roots() {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let a = g.add_child(main, Frame::named("a")).unwrap();
        let b = g.add_child(main, Frame::named("b")).unwrap();

        let keep = HashSet::from([a, b]);
        let (r, map) = g.restrict(&keep).unwrap();
        assert_eq!(r.roots(), &[map[&a], map[&b]]);
    }

    #[test]
    fn test_restrict_can_turn_tree_into_dag() {
        // main -> (x -> leaf, y -> leaf') where only main, x and the first
        // leaf survive but the removed y shares the leaf in a DAG input
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let x = g.add_child(main, Frame::named("x")).unwrap();
        let y = g.add_child(main, Frame::named("y")).unwrap();
        let leaf = g.add_child(x, Frame::named("leaf")).unwrap();
        g.add_edge(y, leaf).unwrap();

        let keep = HashSet::from([main, x, leaf]);
        let (r, map) = g.restrict(&keep).unwrap();
        // leaf is under x and, through the removed y, directly under main
        assert_eq!(r.parents(map[&leaf]).len(), 2);
        assert!(!r.is_tree());
    }

    #[test]
    fn test_restrict_keeps_nids() {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let a = g.add_child(main, Frame::named("a")).unwrap();
        g.enumerate_traverse();

        let (r, map) = g.restrict(&HashSet::from([a])).unwrap();
        assert_eq!(r.node(map[&a]).unwrap().nid(), 1);
    }
}
