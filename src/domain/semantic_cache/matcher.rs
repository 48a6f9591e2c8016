//! Brute-force nearest query search

use crate::domain::embedding::{cosine_similarity, EmbeddingStore};
use crate::domain::DomainError;

use super::config::is_valid_threshold;

/// Best match found by [`SimilarityMatcher::find_best`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarMatch<'a, K> {
    /// The stored query the vector is closest to
    pub query: &'a K,
    /// Cosine similarity between the two vectors
    pub similarity: f32,
}

/// Finds the stored query closest to a vector, if it is close enough.
///
/// Every record is compared, so a lookup costs O(records * dimensions).
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    threshold: f32,
}

impl SimilarityMatcher {
    /// Create a matcher; `threshold` must be in (0.0, 1.0]
    pub fn new(threshold: f32) -> Result<Self, DomainError> {
        if !is_valid_threshold(threshold) {
            return Err(DomainError::invalid_threshold(threshold));
        }

        Ok(Self { threshold })
    }

    /// Get the similarity threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Return the best-scoring record whose similarity strictly exceeds the
    /// threshold.
    ///
    /// On equal scores the earliest inserted record wins. Records whose score
    /// is NaN (non-finite components) are skipped.
    pub fn find_best<'a, K>(
        &self,
        vector: &[f32],
        store: &'a EmbeddingStore<K>,
    ) -> Option<SimilarMatch<'a, K>> {
        let mut best: Option<SimilarMatch<'a, K>> = None;

        for record in store.all() {
            let similarity = cosine_similarity(vector, record.vector());
            if similarity.is_nan() {
                continue;
            }

            if best.as_ref().is_none_or(|b| similarity > b.similarity) {
                best = Some(SimilarMatch {
                    query: record.query(),
                    similarity,
                });
            }
        }

        best.filter(|m| m.similarity > self.threshold)
    }
}
