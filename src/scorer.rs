//! Path-weighted recommendation scoring.
//!
//! Edges cost `1 / weight`, so the cheapest path from the center is the one
//! with the strongest cumulative similarity. Each target's score is the
//! geometric mean of its per-hop terms
//!
//! ```text
//! term_i = weight(p[i-1], p[i]) / degree(p[i-1]) * alpha^(i-1)
//! ```
//!
//! which favors few strong hops through specific (low-degree) bands and
//! decays exponentially with distance from the center.

use log::warn;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::ego::EgoSubgraph;
use crate::models::BandId;

/// Result of a scoring pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSummary {
    pub scored: usize,
    /// Nodes with no path from the center; removed from the subgraph
    pub unreachable: Vec<BandId>,
}

/// Cheapest known path to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub cost: f64,
    /// Node ids from the center to the target, both included
    pub nodes: Vec<BandId>,
}

/// Heap entry ordered so that `BinaryHeap` pops the cheapest node first,
/// lower id first among equal costs.
struct Frontier {
    cost: f64,
    id: BandId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smaller costs come first (min-heap behavior)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Single-source Dijkstra from the ego center over inverted weights.
pub fn shortest_paths(ego: &EgoSubgraph) -> FxHashMap<BandId, ShortestPath> {
    let center = ego.center();
    let mut dist: FxHashMap<BandId, f64> = FxHashMap::default();
    let mut prev: FxHashMap<BandId, BandId> = FxHashMap::default();
    let mut heap = BinaryHeap::new();

    dist.insert(center, 0.0);
    heap.push(Frontier {
        cost: 0.0,
        id: center,
    });

    while let Some(Frontier { cost, id }) = heap.pop() {
        if cost > dist.get(&id).copied().unwrap_or(f64::INFINITY) {
            continue;
        }
        for (neighbor, weight) in ego.neighbors(id) {
            let next = cost + 1.0 / weight as f64;
            if next < dist.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                dist.insert(neighbor, next);
                prev.insert(neighbor, id);
                heap.push(Frontier {
                    cost: next,
                    id: neighbor,
                });
            }
        }
    }

    dist.iter()
        .map(|(&target, &cost)| {
            let mut nodes = vec![target];
            let mut cursor = target;
            while let Some(&p) = prev.get(&cursor) {
                nodes.push(p);
                cursor = p;
            }
            nodes.reverse();
            (target, ShortestPath { cost, nodes })
        })
        .collect()
}

/// Decayed geometric-mean score for a center-to-target path.
///
/// Returns None for the trivial single-node path or if a hop is missing
/// from the subgraph.
pub fn path_score(ego: &EgoSubgraph, path: &[BandId], alpha: f64) -> Option<f64> {
    if path.len() < 2 {
        return None;
    }
    let hops = path.len() - 1;
    let ln_alpha = alpha.ln();
    // Terms stay in log space; alpha^i alone underflows on long paths
    let mut log_sum = 0.0;
    for (i, pair) in path.windows(2).enumerate() {
        let weight = ego.weight(pair[0], pair[1])? as f64;
        let degree = ego.degree(pair[0]) as f64;
        log_sum += weight.ln() - degree.ln() + i as f64 * ln_alpha;
    }
    Some((log_sum / hops as f64).exp())
}

/// Attach cost, path and score to every node of `ego`.
///
/// Unreachable nodes cannot occur for a BFS-extracted subgraph; if one shows
/// up anyway it is dropped with a warning rather than left unscored.
pub fn score(ego: &mut EgoSubgraph, alpha: f64) -> ScoreSummary {
    let paths = shortest_paths(ego);
    let center = ego.center();

    // Scores use degrees of the complete subgraph, so compute them all
    // before touching it.
    let mut scored: Vec<(BandId, f64, Vec<BandId>, Option<f64>)> = Vec::new();
    let mut unreachable = Vec::new();
    for id in ego.node_ids() {
        match paths.get(&id) {
            Some(path) if id == center => scored.push((id, path.cost, Vec::new(), None)),
            Some(path) => {
                let value = path_score(ego, &path.nodes, alpha);
                scored.push((id, path.cost, path.nodes.clone(), value));
            }
            None => unreachable.push(id),
        }
    }

    let mut summary = ScoreSummary::default();
    for (id, cost, nodes, value) in scored {
        if let Some(attrs) = ego.attrs_mut(id) {
            attrs.cost_from_center = Some(cost);
            attrs.path_from_center = nodes;
            attrs.score = value;
        }
        if value.is_some() {
            summary.scored += 1;
        }
    }

    if !unreachable.is_empty() {
        warn!(
            "Dropping {} ego nodes with no path from band {}",
            unreachable.len(),
            center
        );
        for &id in &unreachable {
            ego.remove_node(id);
        }
    }
    summary.unreachable = unreachable;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ego::extract;
    use crate::models::{BandNode, SimilarityEdge};
    use crate::store::SimilarityGraph;

    const A: BandId = 1;
    const B: BandId = 2;
    const C: BandId = 3;

    fn graph(edges: &[(BandId, BandId, i64)]) -> SimilarityGraph {
        let mut ids: Vec<BandId> = edges.iter().flat_map(|&(a, b, _)| [a, b]).collect();
        ids.sort_unstable();
        ids.dedup();
        let nodes = ids
            .into_iter()
            .map(|id| BandNode {
                id,
                name: format!("band{}", id),
                url: None,
            })
            .collect();
        let edges = edges
            .iter()
            .map(|&(a, b, w)| SimilarityEdge::new(a, b, w))
            .collect();
        SimilarityGraph::from_parts(nodes, edges).unwrap()
    }

    fn triangle() -> SimilarityGraph {
        graph(&[(A, B, 10), (B, C, 5), (A, C, 1)])
    }

    #[test]
    fn test_triangle_prefers_strong_two_hop_path() {
        let mut ego = extract(&triangle(), A, 1).unwrap();
        score(&mut ego, 0.1);

        let c = ego.attrs(C).unwrap();
        // A-B-C costs 1/10 + 1/5 = 0.3, cheaper than the direct 1/1
        assert_eq!(c.path_from_center, vec![A, B, C]);
        assert!((c.cost_from_center.unwrap() - 0.3).abs() < 1e-12);

        let b = ego.attrs(B).unwrap();
        assert_eq!(b.path_from_center, vec![A, B]);
        assert!((b.cost_from_center.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_scores_follow_formula() {
        let mut ego = extract(&triangle(), A, 1).unwrap();
        score(&mut ego, 0.1);

        // B: 10 / deg(A)=2 -> 5
        let b = ego.score(B).unwrap();
        assert!((b - 5.0).abs() < 1e-9);

        // C: sqrt((10/2) * (5/2 * 0.1)) = sqrt(1.25)
        let c = ego.score(C).unwrap();
        assert!((c - 1.25f64.sqrt()).abs() < 1e-9);
        assert!(b > c);
    }

    #[test]
    fn test_center_is_unscored_with_zero_cost() {
        let mut ego = extract(&triangle(), A, 2).unwrap();
        let summary = score(&mut ego, 0.1);
        let center = ego.attrs(A).unwrap();
        assert_eq!(center.score, None);
        assert_eq!(center.cost_from_center, Some(0.0));
        assert!(center.path_from_center.is_empty());
        assert_eq!(summary.scored, 2);
        assert!(summary.unreachable.is_empty());
    }

    #[test]
    fn test_alpha_decays_distant_hops() {
        // Chain 1-2-3 with equal weights: the 2-hop target pays alpha once.
        let g = graph(&[(1, 2, 8), (2, 3, 8)]);
        let mut ego = extract(&g, 1, 2).unwrap();
        score(&mut ego, 0.5);
        let near = ego.score(2).unwrap(); // 8 / 1
        let far = ego.score(3).unwrap(); // sqrt(8 * (8 / 2 * 0.5))
        assert!((near - 8.0).abs() < 1e-9);
        assert!((far - 16.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_long_chain_scores_stay_positive() {
        let edges: Vec<(BandId, BandId, i64)> = (1..400).map(|i| (i, i + 1, 10)).collect();
        let mut ego = extract(&graph(&edges), 1, 400).unwrap();
        score(&mut ego, 0.1);

        let s350 = ego.score(350).unwrap();
        assert!(s350 > 0.0 && s350 < 1e-150, "score(350) = {:e}", s350);
        for id in 2..400 {
            assert!(
                ego.score(id).unwrap() > ego.score(id + 1).unwrap(),
                "ranking collapsed at {}",
                id
            );
        }
    }

    #[test]
    fn test_tiny_alpha_keeps_ranking() {
        let g = graph(&[(1, 2, 10), (2, 3, 10), (3, 4, 10)]);
        let mut ego = extract(&g, 1, 3).unwrap();
        score(&mut ego, 1e-200);
        let s3 = ego.score(3).unwrap();
        let s4 = ego.score(4).unwrap();
        assert!(s4 > 0.0);
        assert!(s3 > s4);
        // (ln 10 + ln 5 + ln 5 + 3 ln 1e-200) / 3
        let expected = ((250.0f64).ln() + 3.0 * 1e-200f64.ln()) / 3.0;
        assert!((s4.ln() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_low_degree_intermediate_wins() {
        // Targets 5 and 6 sit behind hubs of different degree.
        let g = graph(&[
            (1, 2, 10),
            (1, 3, 10),
            (2, 5, 10),
            (3, 6, 10),
            (3, 7, 10),
            (3, 8, 10),
        ]);
        let mut ego = extract(&g, 1, 2).unwrap();
        score(&mut ego, 0.1);
        assert!(ego.score(5).unwrap() > ego.score(6).unwrap());
    }

    #[test]
    fn test_path_score_trivial_path() {
        let ego = extract(&triangle(), A, 1).unwrap();
        assert_eq!(path_score(&ego, &[A], 0.1), None);
        assert_eq!(path_score(&ego, &[], 0.1), None);
    }

    #[test]
    fn test_shortest_paths_deterministic_on_ties() {
        // Square 1-2-4, 1-3-4 with equal weights: lower id wins the tie.
        let g = graph(&[(1, 2, 4), (1, 3, 4), (2, 4, 4), (3, 4, 4)]);
        let ego = extract(&g, 1, 2).unwrap();
        for _ in 0..5 {
            let paths = shortest_paths(&ego);
            assert_eq!(paths[&4].nodes, vec![1, 2, 4]);
        }
    }
}
