//! Core data models for band similarity graphs.
//!
//! This module contains the struct definitions, type aliases, and enums
//! shared by the store, the ego pipeline, and the binaries.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Stable band identifier (primary key of `Bands`).
pub type BandId = i64;

// ============================================================================
// Source Models
// ============================================================================

/// Band row from the `Bands` relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BandNode {
    pub id: BandId,
    pub name: String,        // Display name, not unique
    pub url: Option<String>, // Canonical band page, presentation only
}

/// Raw `(band_id, similar_to_id, score)` triple as stored in `Similarities`.
/// The score is kept signed so invalid weights can be rejected at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimilarityEdge {
    pub band_id: BandId,
    pub similar_to_id: BandId,
    pub score: i64,
}

impl SimilarityEdge {
    pub fn new(band_id: BandId, similar_to_id: BandId, score: i64) -> Self {
        Self {
            band_id,
            similar_to_id,
            score,
        }
    }
}

// ============================================================================
// Query Models
// ============================================================================

/// How a query names its center band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CenterRef {
    Id(BandId),
    Name(String),
}

impl fmt::Display for CenterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CenterRef::Id(id) => write!(f, "#{}", id),
            CenterRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Per-query derived attributes, kept in the ego overlay and never on the
/// shared base graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAttrs {
    /// Sum of inverted weights along the chosen path (None until scored)
    pub cost_from_center: Option<f64>,
    /// Node ids from the center to this node; empty for the center itself
    pub path_from_center: Vec<BandId>,
    /// Decayed geometric-mean recommendation score; never set on the center
    pub score: Option<f64>,
}

/// Presentation mode for assembled responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Node radii, radial force factors and stroke widths (rendering-ready)
    #[default]
    Radius,
    /// Raw center-to-node paths for client-side rendering
    Path,
}

impl FromStr for PresentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "radius" => Ok(PresentationMode::Radius),
            "path" => Ok(PresentationMode::Path),
            other => Err(format!("unknown mode '{}' (expected radius or path)", other)),
        }
    }
}

/// How radius mode sizes the non-center nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusMethod {
    /// Path-weighted score from the center; the center itself is pinned
    #[default]
    ShortestPath,
    /// Summed similarity of each node's ego edges, center included.
    /// Surfaces popular bands rather than close ones.
    WeightedDegree,
}

impl FromStr for RadiusMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "shortest_path" => Ok(RadiusMethod::ShortestPath),
            "weighted_degree" => Ok(RadiusMethod::WeightedDegree),
            other => Err(format!(
                "unknown radius method '{}' (expected shortest_path or weighted_degree)",
                other
            )),
        }
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-query pipeline statistics.
#[derive(Default, Debug, Clone, Serialize)]
pub struct EgoStats {
    pub center_id: BandId,
    pub radius: usize,
    pub max_nodes: usize,

    // Extraction
    pub extracted_nodes: usize,
    pub extracted_edges: usize,

    // Scoring
    pub scored_nodes: usize,
    pub unreachable_dropped: usize,

    // Trimming
    pub threshold_score: Option<f64>,
    pub trimmed_below_threshold: usize,
    pub isolated_dropped: usize,

    // Final totals
    pub final_nodes: usize,
    pub final_edges: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl EgoStats {
    /// Fraction of extracted nodes that survived trimming, as a percentage
    pub fn retention_rate(&self) -> f64 {
        if self.extracted_nodes == 0 {
            0.0
        } else {
            100.0 * self.final_nodes as f64 / self.extracted_nodes as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
