//! One ego query, end to end: validate → resolve → extract → score → trim →
//! assemble.
//!
//! Only reads the shared [`SimilarityGraph`]; every mutable step works on the
//! query's own [`EgoSubgraph`], so queries can run in parallel.

use log::{debug, info};
use std::time::Instant;

use crate::assemble::{assemble, EgoResponse};
use crate::config::EgoConfig;
use crate::ego::{extract, EgoSubgraph};
use crate::error::{EgoError, Result};
use crate::models::{BandId, CenterRef, EgoStats};
use crate::scorer::score;
use crate::store::SimilarityGraph;
use crate::trim::trim;

/// Parameters of a single query. Signed so that bad input from the outside
/// world can be reported instead of wrapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParams {
    pub center: CenterRef,
    pub radius: i64,
    pub max_nodes: i64,
}

impl QueryParams {
    /// Query for `center` using the configured default radius and budget.
    pub fn new(center: CenterRef, config: &EgoConfig) -> Self {
        Self {
            center,
            radius: config.radius,
            max_nodes: config.max_nodes,
        }
    }

    pub fn with_radius(mut self, radius: i64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: i64) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Checked `(radius, max_nodes)`.
    pub fn validate(&self) -> Result<(usize, usize)> {
        let radius = usize::try_from(self.radius).map_err(|_| {
            EgoError::InvalidParameter(format!(
                "radius must be non-negative, got {}",
                self.radius
            ))
        })?;
        let max_nodes = usize::try_from(self.max_nodes)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                EgoError::InvalidParameter(format!(
                    "max_nodes must be positive, got {}",
                    self.max_nodes
                ))
            })?;
        Ok((radius, max_nodes))
    }
}

/// Everything a query produced.
#[derive(Debug, Clone)]
pub struct EgoOutcome {
    pub center: BandId,
    pub ego: EgoSubgraph,
    pub response: EgoResponse,
    pub stats: EgoStats,
}

/// Extract, score and trim the ego subgraph of an already-resolved center.
pub fn build_ego(
    graph: &SimilarityGraph,
    config: &EgoConfig,
    center: BandId,
    radius: usize,
    max_nodes: usize,
) -> Result<(EgoSubgraph, EgoStats)> {
    let start = Instant::now();
    let mut stats = EgoStats {
        center_id: center,
        radius,
        max_nodes,
        ..Default::default()
    };

    let mut ego = extract(graph, center, radius)?;
    stats.extracted_nodes = ego.node_count();
    stats.extracted_edges = ego.edge_count();

    let scored = score(&mut ego, config.alpha);
    stats.scored_nodes = scored.scored;
    stats.unreachable_dropped = scored.unreachable.len();

    let trimmed = trim(&mut ego, max_nodes);
    stats.threshold_score = trimmed.threshold;
    stats.trimmed_below_threshold = trimmed.below_threshold;
    stats.isolated_dropped = trimmed.isolated;

    stats.final_nodes = ego.node_count();
    stats.final_edges = ego.edge_count();
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    info!(
        "Making ego graph with shortest paths took {:.3} seconds ({} -> {} nodes)",
        stats.elapsed_seconds, stats.extracted_nodes, stats.final_nodes
    );
    Ok((ego, stats))
}

/// Run a full query. Parameters are validated before any graph work.
pub fn run_query(
    graph: &SimilarityGraph,
    config: &EgoConfig,
    params: &QueryParams,
) -> Result<EgoOutcome> {
    config.validate()?;
    let (radius, max_nodes) = params.validate()?;
    let center = graph.resolve(&params.center)?;
    debug!(
        "Resolved {} to band {} ({})",
        params.center,
        center,
        graph.display_name(center)
    );

    let (ego, stats) = build_ego(graph, config, center, radius, max_nodes)?;
    let response = assemble(graph, &ego, config);
    Ok(EgoOutcome {
        center,
        ego,
        response,
        stats,
    })
}
