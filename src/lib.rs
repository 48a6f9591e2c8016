//! PMP Semantic Cache
//!
//! A two-tier cache for expensive query-to-response computations:
//! - Exact-match LRU tier keyed by the query itself
//! - Similarity tier that reuses a stored response for near-duplicate
//!   queries, using cosine similarity over caller-supplied embeddings
//! - Bounded follow-up history of recent queries
//!
//! ```rust
//! use pmp_semantic_cache::QueryCache;
//!
//! let mut cache: QueryCache<String, String> = QueryCache::with_capacity(3, 0.85)?;
//! let embed = |query: &String| vec![query.len() as f32, 1.0];
//!
//! let first = cache.get_or_compute("total?".to_string(), &embed, |q| format!("answer to {}", q))?;
//! let again = cache.get_or_compute("total?".to_string(), &embed, |_| unreachable!())?;
//!
//! assert!(!first.is_cached());
//! assert!(again.is_cached());
//! # Ok::<(), pmp_semantic_cache::DomainError>(())
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    DomainError, Embedder, EmbeddingRetention, ExactCache, SemanticCacheConfig, SemanticCacheStats,
};
pub use infrastructure::services::{CacheLookup, QueryCache, Resolved, ResponseSource};
