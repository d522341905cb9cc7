//! Presentation-ready ego graph documents.
//!
//! ## Modes
//!
//! - **Radius**: node radii and radial force factors from scores, edge stroke
//!   widths from similarity scores. Ready for a force-directed front end.
//! - **Path**: each node carries its center-to-node path as display names so
//!   the client can work out presentation itself.
//!
//! Both modes report the observed similarity range for legends. Every
//! normalization floors its denominator at 1, so equal values never divide
//! by zero.
//!
//! Display names are not unique. Nodes, link endpoints and paths all use the
//! same label, and a name shared by several bands in one document is
//! suffixed with the band id (`Death (#3)`) so links resolve to one node.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::EgoConfig;
use crate::ego::EgoSubgraph;
use crate::models::{BandId, PresentationMode, RadiusMethod};
use crate::store::SimilarityGraph;

// ============================================================================
// Output Models
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeView {
    pub id: BandId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_radial_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    pub degree: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkView {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    pub sim_score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EgoResponse {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_radius: Option<f64>,
    /// 0 when the subgraph has no edges
    pub min_sim_score: u32,
    pub max_sim_score: u32,
}

impl EgoResponse {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Map `value` from `[min, max]` onto `[0, 1]`, denominator floored at 1.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min).max(1.0)
}

/// Linear rescale of a `[0, 1]` fraction onto `[lo, hi]`.
fn rescale(fraction: f64, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * fraction
}

fn min_max<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Radius for a scored node; unscored non-center nodes get `min_radius`.
pub fn node_radius(score: Option<f64>, range: Option<(f64, f64)>, config: &EgoConfig) -> f64 {
    match (score, range) {
        (Some(s), Some((lo, hi))) => {
            rescale(normalize(s, lo, hi), config.min_radius, config.max_radius)
        }
        _ => config.min_radius,
    }
}

/// Sum of a node's edge weights inside the ego.
fn weighted_degree(ego: &EgoSubgraph, id: BandId) -> f64 {
    ego.neighbors(id).map(|(_, w)| w as f64).sum()
}

/// Radial pull for a force layout: 1 at `min_radius`, 0 at `max_radius`
/// and beyond (which includes the pinned center).
pub fn force_radial_factor(radius: f64, config: &EgoConfig) -> f64 {
    let fraction = normalize(radius, config.min_radius, config.max_radius);
    (1.0 - fraction).max(0.0).powi(2)
}

/// Stroke width from a similarity score, compressed before rescaling.
pub fn stroke_width(weight: u32, range: (u32, u32), config: &EgoConfig) -> f64 {
    let fraction = normalize(weight as f64, range.0 as f64, range.1 as f64);
    rescale(
        fraction.powf(config.width_exponent),
        config.min_width,
        config.max_width,
    )
}

// ============================================================================
// Labels
// ============================================================================

/// Document-wide labels for every band that appears as a node or on a path.
fn labels(graph: &SimilarityGraph, ego: &EgoSubgraph) -> FxHashMap<BandId, String> {
    let mut ids: Vec<BandId> = ego.node_ids().collect();
    for id in ego.node_ids() {
        if let Some(attrs) = ego.attrs(id) {
            ids.extend(attrs.path_from_center.iter().copied());
        }
    }
    ids.sort_unstable();
    ids.dedup();

    let mut uses: FxHashMap<String, usize> = FxHashMap::default();
    for &id in &ids {
        *uses.entry(graph.display_name(id)).or_default() += 1;
    }

    ids.into_iter()
        .map(|id| {
            let name = graph.display_name(id);
            let label = if uses.get(&name).copied().unwrap_or(0) > 1 {
                format!("{} (#{})", name, id)
            } else {
                name
            };
            (id, label)
        })
        .collect()
}

// ============================================================================
// Assembly
// ============================================================================

/// Build the serializable document for a scored (and usually trimmed) ego.
/// The center node is listed first, the rest in id order.
pub fn assemble(graph: &SimilarityGraph, ego: &EgoSubgraph, config: &EgoConfig) -> EgoResponse {
    let center = ego.center();
    let mut order: Vec<BandId> = vec![center];
    order.extend(ego.node_ids().filter(|&id| id != center));
    let by_id = labels(graph, ego);
    let label = |id: BandId| {
        by_id
            .get(&id)
            .cloned()
            .unwrap_or_else(|| graph.display_name(id))
    };

    let weights: Vec<u32> = ego.edges().map(|(_, _, w)| w).collect();
    let weight_range = weights.iter().min().copied().zip(weights.iter().max().copied());
    let (min_sim_score, max_sim_score) = weight_range.unwrap_or((0, 0));

    let links: Vec<LinkView> = ego
        .edges()
        .map(|(a, b, w)| LinkView {
            source: label(a),
            target: label(b),
            stroke_width: match (config.mode, weight_range) {
                (PresentationMode::Radius, Some(range)) => Some(stroke_width(w, range, config)),
                _ => None,
            },
            sim_score: w,
        })
        .collect();

    let nodes: Vec<NodeView> = match config.mode {
        PresentationMode::Radius => {
            let score_range = min_max(order.iter().filter_map(|&id| ego.score(id)));
            let degree_range = min_max(order.iter().map(|&id| weighted_degree(ego, id)));
            order
                .iter()
                .map(|&id| {
                    let radius = match config.radius_method {
                        RadiusMethod::ShortestPath if id == center => {
                            config.center_radius_scale * config.max_radius
                        }
                        RadiusMethod::ShortestPath => {
                            node_radius(ego.score(id), score_range, config)
                        }
                        RadiusMethod::WeightedDegree => {
                            node_radius(Some(weighted_degree(ego, id)), degree_range, config)
                        }
                    };
                    NodeView {
                        id,
                        name: label(id),
                        radius: Some(radius),
                        force_radial_factor: Some(force_radial_factor(radius, config)),
                        path: None,
                        degree: ego.degree(id),
                        band_url: band_url(graph, id),
                    }
                })
                .collect()
        }
        PresentationMode::Path => order
            .iter()
            .map(|&id| {
                let path = ego
                    .attrs(id)
                    .map(|a| {
                        a.path_from_center
                            .iter()
                            .map(|&p| label(p))
                            .collect()
                    })
                    .unwrap_or_default();
                NodeView {
                    id,
                    name: label(id),
                    radius: None,
                    force_radial_factor: None,
                    path: Some(path),
                    degree: ego.degree(id),
                    band_url: band_url(graph, id),
                }
            })
            .collect(),
    };

    let radius_range = min_max(nodes.iter().filter_map(|n| n.radius));

    EgoResponse {
        nodes,
        links,
        min_radius: radius_range.map(|(lo, _)| lo),
        max_radius: radius_range.map(|(_, hi)| hi),
        min_sim_score,
        max_sim_score,
    }
}

fn band_url(graph: &SimilarityGraph, id: BandId) -> Option<String> {
    graph.node(id).and_then(|n| n.url.clone())
}
