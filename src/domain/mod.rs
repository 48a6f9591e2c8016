//! Domain layer - Cache data structures and matching rules

pub mod cache;
pub mod embedding;
pub mod error;
pub mod history;
pub mod semantic_cache;

pub use cache::ExactCache;
pub use embedding::{cosine_similarity, Embedder, EmbeddingRecord, EmbeddingStore};
pub use error::DomainError;
pub use history::QueryHistory;
pub use semantic_cache::{
    EmbeddingRetention, SemanticCacheConfig, SemanticCacheStats, SimilarMatch, SimilarityMatcher,
};
