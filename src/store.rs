//! In-memory similarity graph loaded from the read-only band database.
//!
//! The graph is built once and then only read: ego extraction copies what it
//! needs into its own overlay, so one `SimilarityGraph` can serve many
//! queries at the same time.

use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::time::Instant;

use crate::error::{EgoError, Result};
use crate::models::{BandId, BandNode, CenterRef, SimilarityEdge};
use crate::normalize::{closest_names, fold_band_name};

/// Bands taking part in at least one similarity row.
const NODES_SQL: &str = "SELECT band_id, band, band_url FROM Bands
     WHERE band_id IN (SELECT band_id FROM Similarities)";

/// Similarity rows whose target also takes part in a similarity row.
const EDGES_SQL: &str = "SELECT band_id, similar_to_id, score FROM Similarities
     WHERE similar_to_id IN (SELECT band_id FROM Similarities)";

const MAX_SUGGESTIONS: usize = 3;

/// Weighted undirected band graph keyed by band id.
#[derive(Debug, Default)]
pub struct SimilarityGraph {
    nodes: FxHashMap<BandId, BandNode>,
    adjacency: FxHashMap<BandId, FxHashMap<BandId, u32>>,
    edge_count: usize,
    names: FxHashMap<String, Vec<BandId>>,
    folded_names: FxHashMap<String, Vec<BandId>>,
}

impl SimilarityGraph {
    /// Open `path` read-only and load the whole graph.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            EgoError::DataSource(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::load(&conn)
    }

    /// Read the node and edge relations from an open connection.
    pub fn load(conn: &Connection) -> Result<Self> {
        let start = Instant::now();

        let mut nodes = Vec::new();
        let mut stmt = conn.prepare(NODES_SQL)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            nodes.push(BandNode {
                id: row.get(0)?,
                name: row.get(1)?,
                url: row.get(2)?,
            });
        }

        let mut edges = Vec::new();
        let mut stmt = conn.prepare(EDGES_SQL)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            edges.push(SimilarityEdge::new(row.get(0)?, row.get(1)?, row.get(2)?));
        }

        info!(
            "Fetching from database took {:.3} seconds ({} bands, {} similarity rows)",
            start.elapsed().as_secs_f64(),
            nodes.len(),
            edges.len()
        );

        let start = Instant::now();
        let graph = Self::from_parts(nodes, edges)?;
        info!(
            "Creating similarity graph took {:.3} seconds ({} nodes, {} edges)",
            start.elapsed().as_secs_f64(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build a graph from already-fetched rows.
    ///
    /// Rejects duplicate band ids, non-positive scores and edges whose
    /// endpoints are not in `nodes`. Self-loops are dropped; repeated pairs
    /// keep the highest score.
    pub fn from_parts(nodes: Vec<BandNode>, edges: Vec<SimilarityEdge>) -> Result<Self> {
        let mut graph = SimilarityGraph::default();

        for node in nodes {
            let id = node.id;
            graph
                .names
                .entry(node.name.clone())
                .or_default()
                .push(id);
            graph
                .folded_names
                .entry(fold_band_name(&node.name))
                .or_default()
                .push(id);
            if graph.nodes.insert(id, node).is_some() {
                return Err(EgoError::DataSource(format!("duplicate band id {}", id)));
            }
            graph.adjacency.insert(id, FxHashMap::default());
        }

        let mut self_loops = 0usize;
        let mut merged = 0usize;
        for edge in edges {
            let SimilarityEdge {
                band_id: a,
                similar_to_id: b,
                score,
            } = edge;

            for endpoint in [a, b] {
                if !graph.nodes.contains_key(&endpoint) {
                    return Err(EgoError::DataSource(format!(
                        "similarity {} -> {} references unknown band {}",
                        a, b, endpoint
                    )));
                }
            }
            if score <= 0 {
                return Err(EgoError::DataSource(format!(
                    "similarity {} -> {} has non-positive score {}",
                    a, b, score
                )));
            }
            let weight = u32::try_from(score).map_err(|_| {
                EgoError::DataSource(format!(
                    "similarity {} -> {} score {} out of range",
                    a, b, score
                ))
            })?;

            if a == b {
                self_loops += 1;
                continue;
            }

            if graph.insert_edge(a, b, weight) {
                graph.edge_count += 1;
            } else {
                merged += 1;
            }
        }

        if self_loops > 0 {
            warn!("Dropped {} self-similarity rows", self_loops);
        }
        if merged > 0 {
            debug!("Merged {} repeated similarity pairs (kept max score)", merged);
        }

        for ids in graph.names.values_mut().chain(graph.folded_names.values_mut()) {
            ids.sort_unstable();
        }

        Ok(graph)
    }

    /// Insert or max-merge an undirected edge. Returns true if the pair is new.
    fn insert_edge(&mut self, a: BandId, b: BandId, weight: u32) -> bool {
        let mut is_new = true;
        for (from, to) in [(a, b), (b, a)] {
            let neighbors = self.adjacency.entry(from).or_default();
            match neighbors.get_mut(&to) {
                Some(existing) => {
                    is_new = false;
                    *existing = (*existing).max(weight);
                }
                None => {
                    neighbors.insert(to, weight);
                }
            }
        }
        is_new
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, id: BandId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: BandId) -> Option<&BandNode> {
        self.nodes.get(&id)
    }

    /// Display name, falling back to the id for unknown bands.
    pub fn display_name(&self, id: BandId) -> String {
        self.nodes
            .get(&id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Neighbors of `id` with their similarity score (empty for unknown ids).
    pub fn neighbors(&self, id: BandId) -> impl Iterator<Item = (BandId, u32)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|n| n.iter().map(|(&b, &w)| (b, w)))
    }

    pub fn weight(&self, a: BandId, b: BandId) -> Option<u32> {
        self.adjacency.get(&a).and_then(|n| n.get(&b)).copied()
    }

    pub fn degree(&self, id: BandId) -> usize {
        self.adjacency.get(&id).map_or(0, |n| n.len())
    }

    /// Translate a display name to its unique band id.
    ///
    /// Exact names win; the folded name is only consulted when there is no
    /// exact match at all. Zero or several matches is an error, carrying
    /// near-miss suggestions when nothing matched.
    pub fn resolve_name(&self, name: &str) -> Result<BandId> {
        let folded = fold_band_name(name);
        let matches = match self.names.get(name) {
            Some(ids) => ids.as_slice(),
            None => self
                .folded_names
                .get(&folded)
                .map_or(&[][..], |ids| ids.as_slice()),
        };

        match matches {
            [id] => Ok(*id),
            [] => {
                let suggestions = closest_names(
                    &folded,
                    self.folded_names.keys().map(|k| k.as_str()),
                    MAX_SUGGESTIONS,
                )
                .into_iter()
                .filter_map(|key| self.folded_names.get(key))
                .flat_map(|ids| ids.iter().map(|&id| self.display_name(id)))
                .take(MAX_SUGGESTIONS)
                .collect();
                Err(EgoError::AmbiguousOrMissingName {
                    name: name.to_string(),
                    matches: Vec::new(),
                    suggestions,
                })
            }
            many => Err(EgoError::AmbiguousOrMissingName {
                name: name.to_string(),
                matches: many.to_vec(),
                suggestions: Vec::new(),
            }),
        }
    }

    /// Resolve a query center to a band id present in the graph.
    pub fn resolve(&self, center: &CenterRef) -> Result<BandId> {
        match center {
            CenterRef::Id(id) if self.contains(*id) => Ok(*id),
            CenterRef::Id(id) => Err(EgoError::NodeNotFound(*id)),
            CenterRef::Name(name) => self.resolve_name(name),
        }
    }
}
