//! The call graph: an ordered set of roots over a stable node arena.

use super::frame::Frame;
use super::node::{Node, NodeId};
use super::traverse::{TraversalOrder, Traverse};
use crate::utils::error::GraphError;
use log::debug;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A call graph (tree or DAG)
///
/// Nodes live in a [`StableDiGraph`], so arena indices survive removals.
/// [`NodeId`] is the public handle; the graph maps it to its arena index.
/// Edges are only changed through [`add_edge`](Graph::add_edge) /
/// [`remove_edge`](Graph::remove_edge). Children and parents are listed in
/// the order their edges were added.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    roots: Vec<NodeId>,
    arena: StableDiGraph<Node, ()>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node; it becomes reachable once linked or rooted
    pub fn add_node(&mut self, frame: Frame) -> NodeId {
        self.insert_node(Node::new(frame))
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        let ix = self.arena.add_node(node);
        self.index.insert(id, ix);
        id
    }

    /// Insert a new node and append it to the roots
    pub fn add_root(&mut self, frame: Frame) -> NodeId {
        let id = self.add_node(frame);
        self.roots.push(id);
        id
    }

    /// Insert a new node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, frame: Frame) -> Result<NodeId, GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let id = self.add_node(frame);
        self.add_edge(parent, id)?;
        Ok(id)
    }

    /// Append an existing node to the roots (no-op if it already is one)
    pub fn push_root(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.contains(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        Ok(())
    }

    /// Link `parent -> child` as the last child of `parent`
    ///
    /// Returns `false` when the edge already existed.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<bool, GraphError> {
        if parent == child {
            return Err(GraphError::StructuralMismatch(format!(
                "self-edge on {}",
                parent
            )));
        }
        let p = self.index_of(parent).ok_or(GraphError::NodeNotFound(parent))?;
        let c = self.index_of(child).ok_or(GraphError::NodeNotFound(child))?;
        if self.arena.find_edge(p, c).is_some() {
            return Ok(false);
        }
        self.arena.add_edge(p, c, ());
        Ok(true)
    }

    /// Unlink `parent -> child`
    ///
    /// Returns `false` when there was no such edge.
    pub fn remove_edge(&mut self, parent: NodeId, child: NodeId) -> Result<bool, GraphError> {
        let p = self.index_of(parent).ok_or(GraphError::NodeNotFound(parent))?;
        let c = self.index_of(child).ok_or(GraphError::NodeNotFound(child))?;
        match self.arena.find_edge(p, c) {
            Some(edge) => Ok(self.arena.remove_edge(edge).is_some()),
            None => Ok(false),
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub(crate) fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub(crate) fn arena(&self) -> &StableDiGraph<Node, ()> {
        &self.arena
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).and_then(|ix| self.arena.node_weight(ix))
    }

    pub fn frame(&self, id: NodeId) -> Option<&Frame> {
        self.node(id).map(|n| n.frame())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Neighbors in edge insertion order
    fn neighbors(&self, id: NodeId, dir: Direction) -> Vec<NodeId> {
        let Some(ix) = self.index_of(id) else {
            return Vec::new();
        };
        // petgraph lists the most recently added edge first
        let mut ids: Vec<NodeId> = self
            .arena
            .neighbors_directed(ix, dir)
            .filter_map(|n| self.arena.node_weight(n).map(Node::id))
            .collect();
        ids.reverse();
        ids
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Lazily walk every node reachable from the roots
    pub fn traverse(&self, order: TraversalOrder) -> Traverse<'_> {
        Traverse::new(self, self.roots.clone(), order)
    }

    /// Lazily walk `start` and all of its descendants
    pub fn traverse_from(&self, start: NodeId, order: TraversalOrder) -> Traverse<'_> {
        Traverse::new(self, vec![start], order)
    }

    /// Number of nodes reachable from the roots
    pub fn len(&self) -> usize {
        self.traverse(TraversalOrder::Pre).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of parent/child edges among reachable nodes
    pub fn edge_count(&self) -> usize {
        self.traverse(TraversalOrder::Pre)
            .filter_map(|id| self.index_of(id))
            .map(|ix| self.arena.neighbors_directed(ix, Direction::Outgoing).count())
            .sum()
    }

    /// True iff every root has no parent and every other reachable node exactly one
    pub fn is_tree(&self) -> bool {
        let roots: HashSet<NodeId> = self.roots.iter().copied().collect();
        self.traverse(TraversalOrder::Pre).all(|id| {
            let indegree = self
                .index_of(id)
                .map(|ix| self.arena.neighbors_directed(ix, Direction::Incoming).count())
                .unwrap_or(0);
            if roots.contains(&id) {
                indegree == 0
            } else {
                indegree == 1
            }
        })
    }

    /// Assign preorder traversal numbers to every reachable node
    pub fn enumerate_traverse(&mut self) {
        let order: Vec<NodeId> = self.traverse(TraversalOrder::Pre).collect();
        for (nid, id) in order.into_iter().enumerate() {
            if let Some(node) = self.index_of(id).and_then(|ix| self.arena.node_weight_mut(ix)) {
                node.nid = nid;
            }
        }
    }

    /// Deep copy with fresh node identities
    ///
    /// `node_map` receives old id -> copied id for every reachable node.
    pub fn copy(&self, node_map: &mut HashMap<NodeId, NodeId>) -> Graph {
        let mut copied = Graph::new();
        let order: Vec<NodeId> = self.traverse(TraversalOrder::Pre).collect();
        for &id in &order {
            if let Some(node) = self.node(id) {
                node_map.insert(id, copied.insert_node(node.copy()));
            }
        }
        for &id in &order {
            let Some(&new_parent) = node_map.get(&id) else {
                continue;
            };
            for child in self.children(id) {
                if let Some(&new_child) = node_map.get(&child) {
                    // both endpoints were just inserted
                    let _ = copied.add_edge(new_parent, new_child);
                }
            }
        }
        copied.roots = self.roots.iter().filter_map(|r| node_map.get(r).copied()).collect();
        debug!("Copied graph with {} nodes", order.len());
        copied
    }

    /// The first call path from a root down to `id` (following first parents)
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut seen = HashSet::from([id]);
        let mut current = id;
        while let Some(&parent) = self.parents(current).first() {
            if !seen.insert(parent) {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Set of nodes reachable from the roots
    pub fn reachable(&self) -> HashSet<NodeId> {
        self.traverse(TraversalOrder::Pre).collect()
    }

    /// Verify every root and every id handle resolves to a live arena node
    pub(crate) fn check_arena(&self) -> Result<(), GraphError> {
        for root in &self.roots {
            if !self.contains(*root) {
                return Err(GraphError::StructuralMismatch(format!(
                    "root {} is not in the node arena",
                    root
                )));
            }
        }
        for (&id, &ix) in &self.index {
            if self.arena.node_weight(ix).map(Node::id) != Some(id) {
                return Err(GraphError::StructuralMismatch(format!(
                    "{} does not resolve to its arena slot",
                    id
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn remove_root(&mut self, id: NodeId) {
        self.roots.retain(|&r| r != id);
    }

    /// Drop a node and every edge touching it
    pub(crate) fn remove_node(&mut self, id: NodeId) {
        if let Some(ix) = self.index.remove(&id) {
            self.arena.remove_node(ix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// main -> (solve -> kernel, io)
    fn small_tree() -> (Graph, Vec<NodeId>) {
        let mut g = Graph::new();
        let main = g.add_root(Frame::named("main"));
        let solve = g.add_child(main, Frame::named("solve")).unwrap();
        let kernel = g.add_child(solve, Frame::named("kernel")).unwrap();
        let io = g.add_child(main, Frame::named("io")).unwrap();
        g.enumerate_traverse();
        (g, vec![main, solve, kernel, io])
    }

    #[test]
    fn test_edges_are_symmetric() {
        let (mut g, ids) = small_tree();
        assert_eq!(g.children(ids[0]), &[ids[1], ids[3]]);
        assert_eq!(g.parents(ids[1]), &[ids[0]]);

        assert!(g.remove_edge(ids[0], ids[3]).unwrap());
        assert!(!g.children(ids[0]).contains(&ids[3]));
        assert!(g.parents(ids[3]).is_empty());
        assert!(!g.remove_edge(ids[0], ids[3]).unwrap());
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let (mut g, ids) = small_tree();
        let extra = g.add_child(ids[0], Frame::named("extra")).unwrap();
        g.remove_edge(ids[0], ids[1]).unwrap();
        assert_eq!(g.children(ids[0]), vec![ids[3], extra]);

        g.add_edge(ids[0], ids[1]).unwrap();
        assert_eq!(g.children(ids[0]), vec![ids[3], extra, ids[1]]);
    }

    #[test]
    fn test_remove_node_drops_its_edges() {
        let (mut g, ids) = small_tree();
        g.remove_node(ids[1]);
        assert!(!g.contains(ids[1]));
        assert_eq!(g.children(ids[0]), vec![ids[3]]);
        assert!(g.parents(ids[2]).is_empty());
        assert!(g.check_arena().is_ok());
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let (mut g, ids) = small_tree();
        assert!(!g.add_edge(ids[0], ids[1]).unwrap());
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_self_edge_rejected() {
        let (mut g, ids) = small_tree();
        assert!(matches!(
            g.add_edge(ids[1], ids[1]),
            Err(GraphError::StructuralMismatch(_))
        ));
    }

    #[test]
    fn test_preorder_and_postorder() {
        let (g, ids) = small_tree();
        let pre: Vec<NodeId> = g.traverse(TraversalOrder::Pre).collect();
        assert_eq!(pre, vec![ids[0], ids[1], ids[2], ids[3]]);

        let post: Vec<NodeId> = g.traverse(TraversalOrder::Post).collect();
        assert_eq!(post, vec![ids[2], ids[1], ids[3], ids[0]]);
    }

    #[test]
    fn test_traverse_is_reinvocable() {
        let (g, _) = small_tree();
        assert_eq!(g.traverse(TraversalOrder::Pre).count(), 4);
        assert_eq!(g.traverse(TraversalOrder::Pre).count(), 4);
    }

    #[test]
    fn test_enumerate_traverse_assigns_preorder_ids() {
        let (g, ids) = small_tree();
        let nids: Vec<usize> = ids.iter().map(|&id| g.node(id).unwrap().nid()).collect();
        assert_eq!(nids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_is_tree_and_dag() {
        let (mut g, ids) = small_tree();
        assert!(g.is_tree());

        // io also calls kernel
        g.add_edge(ids[3], ids[2]).unwrap();
        assert!(!g.is_tree());
        assert_eq!(g.len(), 4);
        assert_eq!(g.traverse(TraversalOrder::Post).count(), 4);
    }

    #[test]
    fn test_copy_has_fresh_ids_and_same_shape() {
        let (g, ids) = small_tree();
        let mut map = HashMap::new();
        let copy = g.copy(&mut map);

        assert_eq!(copy.len(), 4);
        assert_eq!(copy.edge_count(), 3);
        for id in &ids {
            assert!(!copy.contains(*id));
            assert_eq!(copy.frame(map[id]), g.frame(*id));
        }
        assert_eq!(copy.roots(), &[map[&ids[0]]]);
    }

    #[test]
    fn test_path_from_root() {
        let (g, ids) = small_tree();
        assert_eq!(g.path(ids[2]), vec![ids[0], ids[1], ids[2]]);
    }
}
