//! Semantic cache domain models
//!
//! Matches new queries against previously seen ones by embedding
//! similarity, so near-duplicate queries can reuse an exact-tier entry.

mod config;
mod matcher;
mod stats;

pub use config::{EmbeddingRetention, SemanticCacheConfig};
pub use matcher::{SimilarMatch, SimilarityMatcher};
pub use stats::SemanticCacheStats;
