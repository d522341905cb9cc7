//! Band similarity ego graphs - shared modules for all binaries.

pub mod assemble;
pub mod config;
pub mod ego;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod scorer;
pub mod store;
pub mod trim;

pub use assemble::EgoResponse;
pub use config::EgoConfig;
pub use ego::EgoSubgraph;
pub use error::{EgoError, Result};
pub use models::{
    BandId, BandNode, CenterRef, EgoStats, PresentationMode, RadiusMethod, SimilarityEdge,
};
pub use pipeline::{run_query, EgoOutcome, QueryParams};
pub use store::SimilarityGraph;
