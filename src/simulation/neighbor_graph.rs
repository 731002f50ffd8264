//! Directed neighbor graph derived from the connectivity model.
//!
//! Rebuilt from scratch on every refresh: each ordered pair of alive nodes is
//! asked once. The diff against the previous edge set is returned so the
//! engine can fire `on_neighborhood_change` on exactly the nodes whose
//! out-neighbors changed.

use std::collections::{BTreeMap, BTreeSet};

use super::models::ConnectivityModel;
use super::node::NodeState;
use super::types::NodeId;

/// Out-neighbors gained and lost by one node in a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodChange {
    pub node: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct NeighborGraph {
    out_edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl NeighborGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full O(n²) re-evaluation over `nodes`. Pairs farther apart than
    /// `max_radius` are never connected and never reach the model.
    pub fn recompute(
        &mut self,
        nodes: &[&NodeState],
        model: &dyn ConnectivityModel,
        max_radius: Option<f64>,
    ) -> Vec<NeighborhoodChange> {
        let max_radius2 = max_radius.map(|r| r * r);
        let mut next: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();

        for from in nodes {
            let out = next.entry(from.id).or_default();
            for to in nodes {
                if from.id == to.id {
                    continue;
                }
                if max_radius2.is_some_and(|limit| from.position.distance2(&to.position) > limit) {
                    continue;
                }
                if model.is_connected(from, to) {
                    out.insert(to.id);
                }
            }
        }

        let changes = diff(&self.out_edges, &next);
        self.out_edges = next;
        changes
    }

    /// Register a node with no edges. Used when connectivity is frozen.
    pub fn insert_isolated(&mut self, id: NodeId) {
        self.out_edges.entry(id).or_default();
    }

    /// Drop `id` and every edge touching it. Returns the changes of the
    /// nodes that had it as an out-neighbor.
    pub fn remove_node(&mut self, id: NodeId) -> Vec<NeighborhoodChange> {
        self.out_edges.remove(&id);
        let mut changes = Vec::new();
        for (node, out) in self.out_edges.iter_mut() {
            if out.remove(&id) {
                changes.push(NeighborhoodChange {
                    node: *node,
                    added: Vec::new(),
                    removed: vec![id],
                });
            }
        }
        changes
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.out_edges.get(&from).is_some_and(|out| out.contains(&to))
    }

    pub fn out_neighbors(&self, id: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.out_edges.get(&id)
    }

    /// All directed edges in `(from, to)` order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.out_edges
            .iter()
            .flat_map(|(from, out)| out.iter().map(move |to| (*from, *to)))
    }

    pub fn edge_count(&self) -> usize {
        self.out_edges.values().map(BTreeSet::len).sum()
    }

    pub fn node_count(&self) -> usize {
        self.out_edges.len()
    }
}

fn diff(
    previous: &BTreeMap<NodeId, BTreeSet<NodeId>>,
    next: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> Vec<NeighborhoodChange> {
    let empty = BTreeSet::new();
    next.iter()
        .filter_map(|(node, out)| {
            let before = previous.get(node).unwrap_or(&empty);
            let added: Vec<NodeId> = out.difference(before).copied().collect();
            let removed: Vec<NodeId> = before.difference(out).copied().collect();
            if added.is_empty() && removed.is_empty() {
                None
            } else {
                Some(NeighborhoodChange {
                    node: *node,
                    added,
                    removed,
                })
            }
        })
        .collect()
}
