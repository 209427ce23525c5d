//! Merging sibling nodes that share a frame.
//!
//! Structural rewrites (squash, union of DAGs) can leave a parent with two
//! children that represent the same thing. Normalization folds each such
//! duplicate into the first occurrence.

use super::frame::Frame;
use super::graph::Graph;
use super::node::NodeId;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

impl Graph {
    /// Merge sibling (and root) nodes with identical frames
    ///
    /// The first sibling survives; later duplicates hand their children and
    /// any extra parents over to it and are dropped from the graph. Repeats
    /// until no parent has two children with the same frame.
    ///
    /// Returns merged node -> surviving node, with chains resolved.
    pub fn normalize(&mut self) -> HashMap<NodeId, NodeId> {
        let mut merges: HashMap<NodeId, NodeId> = HashMap::new();
        // `None` stands for the root list
        let mut queue: VecDeque<Option<NodeId>> = VecDeque::from([None]);
        let mut queued: HashSet<Option<NodeId>> = HashSet::from([None]);

        while let Some(level) = queue.pop_front() {
            queued.remove(&level);
            let siblings = match level {
                None => self.roots().to_vec(),
                Some(id) if self.contains(id) => self.children(id),
                Some(_) => continue,
            };

            let duplicates = self.find_duplicates(&siblings);
            if duplicates.is_empty() {
                for s in siblings {
                    if queued.insert(Some(s)) {
                        queue.push_back(Some(s));
                    }
                }
                continue;
            }

            for (victim, survivor) in duplicates {
                let touched = self.merge_into(victim, survivor);
                merges.insert(victim, survivor);
                for id in touched.into_iter().chain([survivor]) {
                    if queued.insert(Some(id)) {
                        queue.push_back(Some(id));
                    }
                }
            }
            if queued.insert(level) {
                queue.push_back(level);
            }
        }

        if !merges.is_empty() {
            debug!("Normalization merged {} duplicate nodes", merges.len());
        }
        resolve_chains(merges)
    }

    /// (victim, survivor) pairs among a sibling list
    fn find_duplicates(&self, siblings: &[NodeId]) -> Vec<(NodeId, NodeId)> {
        let mut first: HashMap<&Frame, NodeId> = HashMap::new();
        let mut duplicates = Vec::new();
        for &id in siblings {
            let Some(frame) = self.frame(id) else { continue };
            match first.get(frame) {
                Some(&survivor) => duplicates.push((id, survivor)),
                None => {
                    first.insert(frame, id);
                }
            }
        }
        duplicates
    }

    /// Move every edge of `victim` onto `survivor` and drop `victim`
    ///
    /// Returns the parents whose child lists changed.
    fn merge_into(&mut self, victim: NodeId, survivor: NodeId) -> Vec<NodeId> {
        let children = self.children(victim);
        let parents = self.parents(victim);

        for child in children {
            // edges only reference nodes in the arena, so these cannot fail
            let _ = self.remove_edge(victim, child);
            if child != survivor {
                let _ = self.add_edge(survivor, child);
            }
        }
        for &parent in &parents {
            let _ = self.remove_edge(parent, victim);
            if parent != survivor {
                let _ = self.add_edge(parent, survivor);
            }
        }

        self.remove_root(victim);
        self.remove_node(victim);
        parents
    }
}

fn resolve_chains(merges: HashMap<NodeId, NodeId>) -> HashMap<NodeId, NodeId> {
    merges
        .keys()
        .map(|&victim| {
            let mut target = merges[&victim];
            let mut hops = 0;
            while let Some(&next) = merges.get(&target) {
                target = next;
                hops += 1;
                if hops > merges.len() {
                    break;
                }
            }
            (victim, target)
        })
        .collect()
}
