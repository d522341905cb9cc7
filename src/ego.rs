//! Ego subgraph extraction.
//!
//! An [`EgoSubgraph`] owns a copy of the induced adjacency plus the per-node
//! overlay attributes, so scoring and trimming never touch the shared base
//! graph. Ordered maps keep every later step deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{EgoError, Result};
use crate::models::{BandId, NodeAttrs};
use crate::store::SimilarityGraph;

#[derive(Clone, Debug, PartialEq)]
pub struct EgoSubgraph {
    center: BandId,
    adjacency: BTreeMap<BandId, BTreeMap<BandId, u32>>,
    attrs: BTreeMap<BandId, NodeAttrs>,
}

/// Induced subgraph of every node within `radius` hops of `center`.
pub fn extract(graph: &SimilarityGraph, center: BandId, radius: usize) -> Result<EgoSubgraph> {
    if !graph.contains(center) {
        return Err(EgoError::NodeNotFound(center));
    }

    // Unweighted BFS, stopping expansion at the radius
    let mut reached: BTreeSet<BandId> = BTreeSet::new();
    let mut queue: VecDeque<(BandId, usize)> = VecDeque::new();
    reached.insert(center);
    queue.push_back((center, 0));
    while let Some((id, hops)) = queue.pop_front() {
        if hops == radius {
            continue;
        }
        for (neighbor, _) in graph.neighbors(id) {
            if reached.insert(neighbor) {
                queue.push_back((neighbor, hops + 1));
            }
        }
    }

    let adjacency = reached
        .iter()
        .map(|&id| {
            let inside: BTreeMap<BandId, u32> = graph
                .neighbors(id)
                .filter(|(neighbor, _)| reached.contains(neighbor))
                .collect();
            (id, inside)
        })
        .collect();

    let attrs = reached
        .iter()
        .map(|&id| {
            let attrs = if id == center {
                NodeAttrs {
                    cost_from_center: Some(0.0),
                    ..Default::default()
                }
            } else {
                NodeAttrs::default()
            };
            (id, attrs)
        })
        .collect();

    Ok(EgoSubgraph {
        center,
        adjacency,
        attrs,
    })
}

impl EgoSubgraph {
    pub fn center(&self) -> BandId {
        self.center
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn contains(&self, id: BandId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = BandId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Degree within the subgraph (0 for unknown ids).
    pub fn degree(&self, id: BandId) -> usize {
        self.adjacency.get(&id).map_or(0, |n| n.len())
    }

    pub fn weight(&self, a: BandId, b: BandId) -> Option<u32> {
        self.adjacency.get(&a).and_then(|n| n.get(&b)).copied()
    }

    pub fn neighbors(&self, id: BandId) -> impl Iterator<Item = (BandId, u32)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|n| n.iter().map(|(&b, &w)| (b, w)))
    }

    /// Each undirected edge once, as `(low_id, high_id, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (BandId, BandId, u32)> + '_ {
        self.adjacency.iter().flat_map(|(&a, neighbors)| {
            neighbors
                .iter()
                .filter(move |(b, _)| a < **b)
                .map(move |(&b, &w)| (a, b, w))
        })
    }

    pub fn attrs(&self, id: BandId) -> Option<&NodeAttrs> {
        self.attrs.get(&id)
    }

    pub(crate) fn attrs_mut(&mut self, id: BandId) -> Option<&mut NodeAttrs> {
        self.attrs.get_mut(&id)
    }

    pub fn score(&self, id: BandId) -> Option<f64> {
        self.attrs.get(&id).and_then(|a| a.score)
    }

    /// Remove a node and its incident edges. The center is never removed.
    pub(crate) fn remove_node(&mut self, id: BandId) -> bool {
        if id == self.center {
            return false;
        }
        let Some(neighbors) = self.adjacency.remove(&id) else {
            return false;
        };
        for neighbor in neighbors.keys() {
            if let Some(back) = self.adjacency.get_mut(neighbor) {
                back.remove(&id);
            }
        }
        self.attrs.remove(&id);
        true
    }
}
