//! Structural union of two call graphs.

use super::graph::Graph;
use super::node::NodeId;
use crate::utils::error::GraphError;
use log::debug;
use std::collections::{HashMap, HashSet};

/// One pending step of the synchronized walk: merge `left` and `right`
/// sibling lists underneath `parent` (`None` = the root list).
struct MergeTask {
    parent: Option<NodeId>,
    left: Vec<NodeId>,
    right: Vec<NodeId>,
}

impl Graph {
    /// Merge `self` and `other` into a new graph
    ///
    /// Nodes are matched by frame along matching call paths starting at the
    /// roots. A matched pair becomes a single surviving node; a node present
    /// on one side only is copied along with its subtree. `node_map`
    /// receives old id -> surviving id for the reachable nodes of *both*
    /// inputs.
    ///
    /// Sibling order is left siblings first (in order), then right siblings
    /// that found no partner (in order). In DAG inputs a pair whose halves
    /// were already placed apart is linked twice under the current parent;
    /// the merged graph is normalized afterwards so no parent keeps two
    /// children with the same frame, and `node_map` points at the
    /// normalized survivors.
    pub fn union(
        &self,
        other: &Graph,
        node_map: &mut HashMap<NodeId, NodeId>,
    ) -> Result<Graph, GraphError> {
        self.check_arena()?;
        other.check_arena()?;

        let mut merged = Graph::new();
        let mut expanded: HashSet<(Option<NodeId>, Option<NodeId>)> = HashSet::new();
        let mut tasks = vec![MergeTask {
            parent: None,
            left: self.roots().to_vec(),
            right: other.roots().to_vec(),
        }];

        while let Some(task) = tasks.pop() {
            let pairs = pair_by_frame(self, &task.left, other, &task.right)?;
            // pushed in reverse so siblings are expanded in order
            let mut children_tasks = Vec::new();

            for (left, right) in pairs {
                let left_survivor = left.and_then(|id| node_map.get(&id).copied());
                let right_survivor = right.and_then(|id| node_map.get(&id).copied());

                let survivor = match (left_survivor, right_survivor) {
                    (Some(a), Some(b)) if a != b => {
                        // both halves were already placed on different paths
                        debug!("Union: {} and {} already placed apart, linking both", a, b);
                        link(&mut merged, task.parent, a)?;
                        link(&mut merged, task.parent, b)?;
                        continue;
                    }
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => {
                        let source = match (left, right) {
                            (Some(l), _) => self.node(l),
                            (None, Some(r)) => other.node(r),
                            (None, None) => None,
                        }
                        .ok_or_else(|| {
                            GraphError::StructuralMismatch("empty union pair".to_string())
                        })?;
                        merged.insert_node(source.copy())
                    }
                };

                for id in [left, right].into_iter().flatten() {
                    node_map.entry(id).or_insert(survivor);
                }
                link(&mut merged, task.parent, survivor)?;

                if expanded.insert((left, right)) {
                    children_tasks.push(MergeTask {
                        parent: Some(survivor),
                        left: left.map(|id| self.children(id)).unwrap_or_default(),
                        right: right.map(|id| other.children(id)).unwrap_or_default(),
                    });
                }
            }

            tasks.extend(children_tasks.into_iter().rev());
        }

        let merges = merged.normalize();
        if !merges.is_empty() {
            for survivor in node_map.values_mut() {
                if let Some(&target) = merges.get(survivor) {
                    *survivor = target;
                }
            }
        }

        merged.enumerate_traverse();
        debug!(
            "Union of {} and {} nodes produced {} nodes",
            self.len(),
            other.len(),
            merged.len()
        );
        Ok(merged)
    }
}

fn link(graph: &mut Graph, parent: Option<NodeId>, child: NodeId) -> Result<(), GraphError> {
    match parent {
        Some(p) if p != child => graph.add_edge(p, child).map(|_| ()),
        Some(_) => Ok(()),
        None => graph.push_root(child),
    }
}

/// Pair each left sibling with the first unused right sibling of equal frame
fn pair_by_frame(
    left_graph: &Graph,
    left: &[NodeId],
    right_graph: &Graph,
    right: &[NodeId],
) -> Result<Vec<(Option<NodeId>, Option<NodeId>)>, GraphError> {
    let mut used = vec![false; right.len()];
    let mut pairs = Vec::with_capacity(left.len() + right.len());

    for &l in left {
        let frame = left_graph.frame(l).ok_or(GraphError::NodeNotFound(l))?;
        let mut partner = None;
        for (i, &r) in right.iter().enumerate() {
            if used[i] {
                continue;
            }
            let other_frame = right_graph.frame(r).ok_or(GraphError::NodeNotFound(r))?;
            if other_frame == frame {
                used[i] = true;
                partner = Some(r);
                break;
            }
        }
        pairs.push((Some(l), partner));
    }

    for (i, &r) in right.iter().enumerate() {
        if !used[i] {
            pairs.push((None, Some(r)));
        }
    }

    Ok(pairs)
}
