//! Bounding an ego subgraph to a node budget.

use log::debug;

use crate::ego::EgoSubgraph;
use crate::models::BandId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrimSummary {
    /// Order statistic used as the cut; None when nothing had to be cut
    pub threshold: Option<f64>,
    pub below_threshold: usize,
    pub isolated: usize,
}

/// Value at ascending rank `rank` (0-based) via partition select.
/// Returns None when `rank` is past the end.
pub fn order_statistic(values: &mut [f64], rank: usize) -> Option<f64> {
    if rank >= values.len() {
        return None;
    }
    let (_, nth, _) = values.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
    Some(*nth)
}

/// Drop the lowest-scoring nodes until about `max_nodes` remain, then drop
/// any node left without edges. The center always survives.
///
/// Ties at the cut all survive, so the result can exceed `max_nodes` by the
/// number of nodes sharing the threshold score.
pub fn trim(ego: &mut EgoSubgraph, max_nodes: usize) -> TrimSummary {
    let mut summary = TrimSummary::default();
    let count = ego.node_count();
    if count <= max_nodes {
        return summary;
    }

    let center = ego.center();
    let mut scores: Vec<f64> = ego
        .node_ids()
        .filter(|&id| id != center)
        .filter_map(|id| ego.score(id))
        .collect();
    let to_remove = count - max_nodes;

    // A budget that leaves no room past the center cuts every scored node
    let threshold = order_statistic(&mut scores, to_remove);
    summary.threshold = threshold;

    let doomed: Vec<BandId> = ego
        .node_ids()
        .filter(|&id| id != center)
        .filter(|&id| match (ego.score(id), threshold) {
            (Some(score), Some(limit)) => score < limit,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .collect();
    for id in doomed {
        if ego.remove_node(id) {
            summary.below_threshold += 1;
        }
    }

    loop {
        let isolated: Vec<BandId> = ego
            .node_ids()
            .filter(|&id| id != center && ego.degree(id) == 0)
            .collect();
        if isolated.is_empty() {
            break;
        }
        for id in isolated {
            if ego.remove_node(id) {
                summary.isolated += 1;
            }
        }
    }

    debug!(
        "Trimmed ego of band {} from {} to {} nodes (threshold {:?}, {} isolated)",
        center,
        count,
        ego.node_count(),
        threshold,
        summary.isolated
    );
    summary
}
