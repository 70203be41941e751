/*!
# SIRA Runtime - Core Recommendation Runtime

This crate contains the student-similarity recommender.

## Architecture

- **Similarity Scorer**: cosine similarity over feature vectors
- **Ranking Engine**: scores one student against all others and keeps the top-K
- **Result Cache seam**: cache-aside contract the engine checks before loading data
- **Vector Source seam**: where student feature tables come from
*/

pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod similarity;
pub mod store;
pub mod types;

// Re-export main components
pub use cache::{CacheConfig, ResultCache, DEFAULT_CACHE_TTL};
pub use config::ServiceConfig;
pub use engine::RecommendationEngine;
pub use errors::{SiraError, SiraResult};
pub use similarity::cosine_similarity;
pub use store::VectorSource;
pub use types::{
    CacheStatus, Entity, RecommendationResponse, SimilarityResult, StudentId, StudentRequest,
    StudentTable,
};

/// Runtime version
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
