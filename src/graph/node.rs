//! Call-graph nodes and their identities.

use super::frame::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque node identity
///
/// Unique per node instance for the lifetime of the process, so ids from
/// two unrelated graphs never collide. Independent of the node's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh, never-before-used id
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A vertex of the call graph
///
/// Edges are owned by the [`Graph`](super::Graph) holding the node, not by
/// the node itself.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    frame: Frame,
    /// Traversal-order number assigned by the owning graph
    pub(crate) nid: usize,
}

impl Node {
    pub fn new(frame: Frame) -> Self {
        Self {
            id: NodeId::fresh(),
            frame,
            nid: 0,
        }
    }

    /// New node with the same frame and nid and a fresh identity
    pub fn copy(&self) -> Self {
        Self {
            id: NodeId::fresh(),
            frame: self.frame.clone(),
            nid: self.nid,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn nid(&self) -> usize {
        self.nid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_copy_keeps_frame_and_nid_only() {
        let mut node = Node::new(Frame::named("main"));
        node.nid = 7;

        let copy = node.copy();
        assert_ne!(copy.id(), node.id());
        assert_eq!(copy.frame(), node.frame());
        assert_eq!(copy.nid(), 7);
    }
}
