//! Semantic cache configuration

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// What happens to a query's embedding when its exact entry is evicted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingRetention {
    /// Embeddings are never dropped; a match may point at an evicted entry
    #[default]
    Unbounded,
    /// Embeddings are dropped together with their exact entry
    FollowEviction,
}

/// Configuration for the two-tier query cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Maximum number of exact entries (zero disables storage)
    #[serde(default = "default_capacity")]
    pub capacity: i64,

    /// Similarity a stored query must strictly exceed to be reused (0.0, 1.0]
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of recent queries kept for follow-up context
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Embedding lifecycle relative to exact-tier eviction
    #[serde(default)]
    pub embedding_retention: EmbeddingRetention,
}

fn default_capacity() -> i64 {
    3
}

fn default_similarity_threshold() -> f32 {
    0.85
}

fn default_history_size() -> usize {
    5
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            similarity_threshold: default_similarity_threshold(),
            history_size: default_history_size(),
            embedding_retention: EmbeddingRetention::default(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exact-tier capacity
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the follow-up history size
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Set the embedding retention policy
    pub fn with_embedding_retention(mut self, retention: EmbeddingRetention) -> Self {
        self.embedding_retention = retention;
        self
    }

    /// Capacity as a size, rejecting negative values
    pub fn checked_capacity(&self) -> Result<usize, DomainError> {
        usize::try_from(self.capacity).map_err(|_| DomainError::invalid_capacity(self.capacity))
    }

    /// Validate capacity and threshold ranges
    pub fn validate(&self) -> Result<(), DomainError> {
        self.checked_capacity()?;

        if !is_valid_threshold(self.similarity_threshold) {
            return Err(DomainError::invalid_threshold(self.similarity_threshold));
        }

        Ok(())
    }
}

/// Whether `threshold` lies in (0.0, 1.0]
pub(crate) fn is_valid_threshold(threshold: f32) -> bool {
    threshold > 0.0 && threshold <= 1.0
}
