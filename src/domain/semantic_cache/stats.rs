//! Query cache statistics

use serde::{Deserialize, Serialize};

/// Counters describing how the query cache has been used
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticCacheStats {
    /// Live entries in the exact tier
    pub entries: usize,
    /// Records in the embedding store
    pub embeddings: usize,
    /// Lookups answered by key equality
    pub exact_hits: u64,
    /// Lookups answered through a similar stored query
    pub similar_hits: u64,
    /// Similar matches whose entry had already been evicted
    pub stale_matches: u64,
    /// Lookups that found nothing (stale matches included)
    pub misses: u64,
    /// Entries evicted from the exact tier
    pub evictions: u64,
}

impl SemanticCacheStats {
    /// Total hits across both tiers
    pub fn hits(&self) -> u64 {
        self.exact_hits + self.similar_hits
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits() + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits() as f32 / total as f32
    }
}
