//! Insertion-ordered log of query embeddings

use std::borrow::Borrow;
use std::slice;

use crate::domain::DomainError;

/// A stored query together with its embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord<K> {
    query: K,
    vector: Vec<f32>,
}

impl<K> EmbeddingRecord<K> {
    /// Create a new record
    pub fn new(query: K, vector: Vec<f32>) -> Self {
        Self { query, vector }
    }

    /// Get the original query
    pub fn query(&self) -> &K {
        &self.query
    }

    /// Get the embedding vector
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Append-only collection of embedding records, scanned by similarity search.
///
/// The first appended vector fixes the dimensionality; later vectors must
/// match it. Records keep insertion order, which the matcher relies on for
/// its tie-break.
#[derive(Debug, Clone)]
pub struct EmbeddingStore<K> {
    records: Vec<EmbeddingRecord<K>>,
    dimensions: Option<usize>,
}

impl<K> Default for EmbeddingStore<K> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dimensions: None,
        }
    }
}

impl<K> EmbeddingStore<K> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensionality fixed by the first append, if any
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Verify that a vector would be accepted by [`append`](Self::append)
    pub fn check_dimensions(&self, vector: &[f32]) -> Result<(), DomainError> {
        match self.dimensions {
            Some(expected) if expected != vector.len() => {
                Err(DomainError::dimension_mismatch(expected, vector.len()))
            }
            _ => Ok(()),
        }
    }

    /// Append a record, fixing the dimensionality on first use
    pub fn append(&mut self, query: K, vector: Vec<f32>) -> Result<(), DomainError> {
        self.check_dimensions(&vector)?;

        self.dimensions.get_or_insert(vector.len());
        self.records.push(EmbeddingRecord::new(query, vector));

        Ok(())
    }

    /// Scan all records in insertion order.
    ///
    /// Each call starts a fresh pass over the current records.
    pub fn all(&self) -> slice::Iter<'_, EmbeddingRecord<K>> {
        self.records.iter()
    }

    /// Remove every record stored for `query`, returning how many were dropped.
    ///
    /// The dimensionality stays fixed.
    pub fn remove<Q>(&mut self, query: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let before = self.records.len();
        self.records
            .retain(|record| Borrow::<Q>::borrow(&record.query) != query);
        before - self.records.len()
    }

    /// Drop all records and forget the dimensionality
    pub fn clear(&mut self) {
        self.records.clear();
        self.dimensions = None;
    }
}
