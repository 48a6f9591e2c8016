//! Two-tier query cache service
//!
//! Answers a query from the exact LRU tier when the key is already
//! cached, otherwise embeds the query and looks for a near-duplicate in the
//! embedding store. The matched query is then read through the exact tier,
//! so a match whose entry was evicted still counts as a miss.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::domain::cache::ExactCache;
use crate::domain::embedding::{Embedder, EmbeddingStore};
use crate::domain::history::QueryHistory;
use crate::domain::semantic_cache::{
    EmbeddingRetention, SemanticCacheConfig, SemanticCacheStats, SimilarityMatcher,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_cache_eviction, record_cache_lookup, record_cache_store, LookupOutcome,
};

/// Which tier answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    /// Same key was already cached
    Exact,
    /// A similar stored query was reused
    Similar,
}

/// A response served from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<K, V> {
    /// The cached response
    pub response: V,
    /// Stored query whose response was reused
    pub matched_query: K,
    /// Similarity between the lookup and the matched query (1.0 for exact hits)
    pub similarity: f32,
    /// Tier that answered
    pub kind: HitKind,
}

/// Outcome of [`QueryCache::lookup`]
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<K, V> {
    /// A usable response was found
    Hit(CacheHit<K, V>),
    /// Nothing usable; carries the query embedding for a following `store`
    Miss { embedding: Vec<f32> },
}

impl<K, V> CacheLookup<K, V> {
    /// Whether the lookup found a response
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Whether the lookup found nothing
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Get the response, if any
    pub fn response(&self) -> Option<&V> {
        match self {
            Self::Hit(hit) => Some(&hit.response),
            Self::Miss { .. } => None,
        }
    }

    /// Consume and return the response, if any
    pub fn into_response(self) -> Option<V> {
        match self {
            Self::Hit(hit) => Some(hit.response),
            Self::Miss { .. } => None,
        }
    }
}

/// Where a resolved response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the cache
    Cached(HitKind),
    /// Computed on a miss and then stored
    Computed,
}

/// Result of [`QueryCache::get_or_compute`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<V> {
    pub response: V,
    pub source: ResponseSource,
}

impl<V> Resolved<V> {
    /// Whether the response came from the cache
    pub fn is_cached(&self) -> bool {
        matches!(self.source, ResponseSource::Cached(_))
    }
}

#[derive(Debug, Clone, Default)]
struct Counters {
    exact_hits: u64,
    similar_hits: u64,
    stale_matches: u64,
    misses: u64,
    evictions: u64,
}

/// Exact LRU cache plus embedding-similarity fallback.
///
/// The cache never computes responses or embeddings itself: embedders are
/// passed to [`lookup`](Self::lookup) and responses to
/// [`store`](Self::store). [`get_or_compute`](Self::get_or_compute) wires
/// both together for callers that want the whole protocol.
///
/// All state is owned by the value and mutated through `&mut self`. Share
/// it across threads only behind a single lock around the whole cache.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    exact: ExactCache<K, V>,
    embeddings: EmbeddingStore<K>,
    matcher: SimilarityMatcher,
    history: QueryHistory<K>,
    retention: EmbeddingRetention,
    counters: Counters,
}

impl<K, V> QueryCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    /// Create a cache from configuration
    pub fn new(config: &SemanticCacheConfig) -> Result<Self, DomainError> {
        let capacity = config.checked_capacity()?;
        let matcher = SimilarityMatcher::new(config.similarity_threshold)?;

        info!(
            capacity,
            threshold = config.similarity_threshold,
            retention = ?config.embedding_retention,
            "Query cache created"
        );

        Ok(Self {
            exact: ExactCache::new(capacity),
            embeddings: EmbeddingStore::new(),
            matcher,
            history: QueryHistory::new(config.history_size),
            retention: config.embedding_retention,
            counters: Counters::default(),
        })
    }

    /// Create a cache with the given capacity and threshold, other settings default
    pub fn with_capacity(capacity: i64, similarity_threshold: f32) -> Result<Self, DomainError> {
        Self::new(
            &SemanticCacheConfig::new()
                .with_capacity(capacity)
                .with_similarity_threshold(similarity_threshold),
        )
    }

    /// Look up a response for `query` without computing anything.
    ///
    /// The embedder is only invoked when the exact tier misses.
    pub fn lookup<E>(&mut self, query: &K, embedder: &E) -> CacheLookup<K, V>
    where
        E: Embedder<K> + ?Sized,
    {
        if let Some(response) = self.exact.get(query) {
            let hit = CacheHit {
                response: response.clone(),
                matched_query: query.clone(),
                similarity: 1.0,
                kind: HitKind::Exact,
            };

            self.counters.exact_hits += 1;
            record_cache_lookup(LookupOutcome::Exact);
            debug!(?query, "Exact cache hit");

            return CacheLookup::Hit(hit);
        }

        let embedding = embedder.embed(query);

        let Some(found) = self.matcher.find_best(&embedding, &self.embeddings) else {
            self.counters.misses += 1;
            record_cache_lookup(LookupOutcome::Miss);
            debug!(?query, "Query cache miss");

            return CacheLookup::Miss { embedding };
        };

        match self.exact.get(found.query) {
            Some(response) => {
                let hit = CacheHit {
                    response: response.clone(),
                    matched_query: found.query.clone(),
                    similarity: found.similarity,
                    kind: HitKind::Similar,
                };

                self.counters.similar_hits += 1;
                record_cache_lookup(LookupOutcome::Similar);
                debug!(
                    ?query,
                    matched = ?hit.matched_query,
                    similarity = hit.similarity,
                    "Cache hit for similar query"
                );

                CacheLookup::Hit(hit)
            }
            None => {
                warn!(
                    ?query,
                    matched = ?found.query,
                    similarity = found.similarity,
                    "Similar query matched an evicted entry"
                );

                self.counters.stale_matches += 1;
                self.counters.misses += 1;
                record_cache_lookup(LookupOutcome::Stale);

                CacheLookup::Miss { embedding }
            }
        }
    }

    /// Store a computed response together with the query embedding.
    ///
    /// Either both tiers are updated or, on a dimension mismatch, neither.
    pub fn store(&mut self, query: K, vector: Vec<f32>, response: V) -> Result<(), DomainError> {
        if let Err(e) = self.embeddings.check_dimensions(&vector) {
            warn!(?query, "Rejected cache store: {}", e);
            return Err(e);
        }

        let displaced = self.exact.put(query.clone(), response);
        self.embeddings.append(query, vector)?;
        record_cache_store();

        if let Some((evicted, _)) = displaced {
            if self.exact.capacity() > 0 {
                self.counters.evictions += 1;
                record_cache_eviction();
                debug!(?evicted, "Evicted least recently used entry");
            }

            if self.retention == EmbeddingRetention::FollowEviction {
                self.embeddings.remove(&evicted);
            }
        }

        Ok(())
    }

    /// Return a cached response or compute, store, and return a new one.
    ///
    /// Queries that miss are recorded in the follow-up history.
    pub fn get_or_compute<E, F>(
        &mut self,
        query: K,
        embedder: &E,
        compute: F,
    ) -> Result<Resolved<V>, DomainError>
    where
        E: Embedder<K> + ?Sized,
        F: FnOnce(&K) -> V,
    {
        self.try_get_or_compute(query, embedder, |q| Ok::<V, DomainError>(compute(q)))
    }

    /// Like [`get_or_compute`](Self::get_or_compute) with a fallible compute
    /// step. Nothing is stored when `compute` fails, and `compute` is not
    /// called when the query embedding has the wrong dimensionality.
    pub fn try_get_or_compute<E, F, CE>(
        &mut self,
        query: K,
        embedder: &E,
        compute: F,
    ) -> Result<Resolved<V>, CE>
    where
        E: Embedder<K> + ?Sized,
        F: FnOnce(&K) -> Result<V, CE>,
        CE: From<DomainError>,
    {
        let embedding = match self.lookup(&query, embedder) {
            CacheLookup::Hit(hit) => {
                return Ok(Resolved {
                    response: hit.response,
                    source: ResponseSource::Cached(hit.kind),
                });
            }
            CacheLookup::Miss { embedding } => embedding,
        };

        if let Err(e) = self.embeddings.check_dimensions(&embedding) {
            warn!(?query, "Skipping compute: {}", e);
            return Err(e.into());
        }

        self.history.record(query.clone());

        let response = compute(&query)?;
        self.store(query, embedding, response.clone())?;

        Ok(Resolved {
            response,
            source: ResponseSource::Computed,
        })
    }

    /// Snapshot of sizes and counters
    pub fn stats(&self) -> SemanticCacheStats {
        SemanticCacheStats {
            entries: self.exact.len(),
            embeddings: self.embeddings.len(),
            exact_hits: self.counters.exact_hits,
            similar_hits: self.counters.similar_hits,
            stale_matches: self.counters.stale_matches,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        }
    }

    /// Recent queries that missed the cache
    pub fn history(&self) -> &QueryHistory<K> {
        &self.history
    }

    /// The exact tier
    pub fn exact(&self) -> &ExactCache<K, V> {
        &self.exact
    }

    /// The embedding store
    pub fn embeddings(&self) -> &EmbeddingStore<K> {
        &self.embeddings
    }

    /// Get the similarity threshold
    pub fn similarity_threshold(&self) -> f32 {
        self.matcher.threshold()
    }

    /// Exact-tier capacity
    pub fn capacity(&self) -> usize {
        self.exact.capacity()
    }

    /// Live exact entries
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Whether the exact tier is empty
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Drop both tiers; counters and history are kept
    pub fn clear(&mut self) {
        self.exact.clear();
        self.embeddings.clear();
        debug!("Query cache cleared");
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Display,
{
    /// Answer a follow-up question with the recent-query context
    pub fn follow_up(&self, follow_up: &str) -> String {
        self.history.follow_up(follow_up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::HashEmbedder;
    use std::cell::Cell;
    use std::collections::HashMap;

    const AVERAGE: &str = "What is the average transaction amount?";

    /// Embedder backed by a fixed table; unknown queries map to a zero vector
    fn stub(entries: Vec<(&'static str, Vec<f32>)>) -> impl Fn(&String) -> Vec<f32> {
        let table: HashMap<&'static str, Vec<f32>> = entries.into_iter().collect();
        move |query: &String| {
            table
                .get(query.as_str())
                .cloned()
                .unwrap_or_else(|| vec![0.0, 0.0])
        }
    }

    /// Unit vector at the given cosine from [1, 0]
    fn at_cosine(cos: f32) -> Vec<f32> {
        vec![cos, (1.0 - cos * cos).sqrt()]
    }

    fn q(text: &str) -> String {
        text.to_string()
    }

    fn create_cache(capacity: i64) -> QueryCache<String, String> {
        QueryCache::with_capacity(capacity, 0.85).unwrap()
    }

    #[test]
    fn test_store_then_exact_lookup() {
        let mut cache = create_cache(3);
        cache
            .store(q(AVERAGE), vec![1.0, 0.0], q("avg: 42"))
            .unwrap();

        let calls = Cell::new(0);
        let embedder = |_: &String| {
            calls.set(calls.get() + 1);
            vec![1.0, 0.0]
        };

        let result = cache.lookup(&q(AVERAGE), &embedder);

        match result {
            CacheLookup::Hit(hit) => {
                assert_eq!(hit.response, "avg: 42");
                assert_eq!(hit.kind, HitKind::Exact);
                assert_eq!(hit.similarity, 1.0);
            }
            CacheLookup::Miss { .. } => panic!("expected exact hit"),
        }
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_similar_query_above_threshold_hits() {
        let mut cache = create_cache(3);
        cache
            .store(q(AVERAGE), vec![1.0, 0.0], q("avg: 42"))
            .unwrap();

        let embedder = stub(vec![("what's the mean amount?", at_cosine(0.9))]);
        let result = cache.lookup(&q("what's the mean amount?"), &embedder);

        match result {
            CacheLookup::Hit(hit) => {
                assert_eq!(hit.response, "avg: 42");
                assert_eq!(hit.matched_query, AVERAGE);
                assert_eq!(hit.kind, HitKind::Similar);
                assert!((hit.similarity - 0.9).abs() < 0.001);
            }
            CacheLookup::Miss { .. } => panic!("expected similar hit"),
        }
        assert_eq!(cache.stats().similar_hits, 1);
    }

    #[test]
    fn test_similar_query_below_threshold_misses() {
        let mut cache = create_cache(3);
        cache
            .store(q(AVERAGE), vec![1.0, 0.0], q("avg: 42"))
            .unwrap();

        let embedder = stub(vec![("total amount?", at_cosine(0.8))]);
        let result = cache.lookup(&q("total amount?"), &embedder);

        assert!(result.is_miss());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_miss_on_empty_cache_carries_embedding() {
        let mut cache = create_cache(3);
        let embedder = stub(vec![("hello", vec![0.6, 0.8])]);

        let result = cache.lookup(&q("hello"), &embedder);

        assert_eq!(
            result,
            CacheLookup::Miss {
                embedding: vec![0.6, 0.8]
            }
        );
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = create_cache(3);
        let embedder = stub(vec![]);

        for (name, vector) in [
            ("A", vec![1.0, 0.0]),
            ("B", vec![0.0, 1.0]),
            ("C", vec![-1.0, 0.0]),
            ("D", vec![0.0, -1.0]),
        ] {
            cache.store(q(name), vector, format!("resp {}", name)).unwrap();
        }

        assert!(cache.lookup(&q("A"), &embedder).is_miss());
        assert!(cache.lookup(&q("B"), &embedder).is_hit());
        assert!(cache.lookup(&q("C"), &embedder).is_hit());
        assert!(cache.lookup(&q("D"), &embedder).is_hit());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lookup_promotes_entry() {
        let mut cache = create_cache(3);
        let embedder = stub(vec![]);

        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();
        cache.store(q("B"), vec![0.0, 1.0], q("b")).unwrap();
        cache.store(q("C"), vec![-1.0, 0.0], q("c")).unwrap();
        assert!(cache.lookup(&q("A"), &embedder).is_hit());
        cache.store(q("D"), vec![0.0, -1.0], q("d")).unwrap();

        assert!(cache.exact().contains("A"));
        assert!(!cache.exact().contains("B"));
    }

    #[test]
    fn test_match_then_evicted_is_miss() {
        let mut cache = create_cache(1);
        cache.store(q("Q1"), vec![1.0, 0.0], q("first")).unwrap();
        cache.store(q("Q2"), vec![0.0, 1.0], q("second")).unwrap();

        assert!(!cache.exact().contains("Q1"));
        assert_eq!(cache.embeddings().len(), 2);

        let embedder = stub(vec![("almost Q1", vec![1.0, 0.01])]);
        let result = cache.lookup(&q("almost Q1"), &embedder);

        assert!(result.is_miss());
        let stats = cache.stats();
        assert_eq!(stats.stale_matches, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_follow_eviction_drops_embeddings() {
        let config = SemanticCacheConfig::new()
            .with_capacity(1)
            .with_embedding_retention(EmbeddingRetention::FollowEviction);
        let mut cache: QueryCache<String, String> = QueryCache::new(&config).unwrap();

        cache.store(q("Q1"), vec![1.0, 0.0], q("first")).unwrap();
        cache.store(q("Q2"), vec![0.0, 1.0], q("second")).unwrap();

        assert_eq!(cache.embeddings().len(), 1);

        let embedder = stub(vec![("almost Q1", vec![1.0, 0.01])]);
        assert!(cache.lookup(&q("almost Q1"), &embedder).is_miss());
        assert_eq!(cache.stats().stale_matches, 0);
    }

    #[test]
    fn test_zero_capacity_never_hits() {
        let mut cache = create_cache(0);
        let embedder = stub(vec![("A", vec![1.0, 0.0])]);

        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();

        assert!(cache.is_empty());
        assert!(cache.lookup(&q("A"), &embedder).is_miss());
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_dimension_mismatch_leaves_state_unchanged() {
        let mut cache = create_cache(3);
        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();

        let result = cache.store(q("B"), vec![1.0, 0.0, 0.0], q("b"));

        assert!(matches!(
            result,
            Err(DomainError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(cache.len(), 1);
        assert!(!cache.exact().contains("B"));
        assert_eq!(cache.embeddings().len(), 1);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            QueryCache::<String, String>::with_capacity(-1, 0.85),
            Err(DomainError::InvalidCapacity { capacity: -1 })
        ));
        assert!(matches!(
            QueryCache::<String, String>::with_capacity(3, 0.0),
            Err(DomainError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_get_or_compute_computes_once() {
        let mut cache: QueryCache<String, serde_json::Value> =
            QueryCache::with_capacity(3, 0.85).unwrap();
        let embedder = HashEmbedder::new(8);
        let computed = Cell::new(0);
        let compute = |_: &String| {
            computed.set(computed.get() + 1);
            serde_json::json!({"Client A": 150.25, "Client B": 98.0})
        };

        let first = cache
            .get_or_compute(q(AVERAGE), &embedder, compute)
            .unwrap();
        let second = cache
            .get_or_compute(q(AVERAGE), &embedder, compute)
            .unwrap();

        assert_eq!(first.source, ResponseSource::Computed);
        assert_eq!(second.source, ResponseSource::Cached(HitKind::Exact));
        assert_eq!(first.response, second.response);
        assert_eq!(computed.get(), 1);
        assert_eq!(cache.history().len(), 1);
    }

    #[test]
    fn test_try_get_or_compute_error_stores_nothing() {
        let mut cache = create_cache(3);
        let embedder = stub(vec![("A", vec![1.0, 0.0])]);

        let result: Result<Resolved<String>, DomainError> =
            cache.try_get_or_compute(q("A"), &embedder, |_| {
                Err(DomainError::configuration("compute failed"))
            });

        assert!(result.is_err());
        assert!(cache.is_empty());
        assert!(cache.embeddings().is_empty());
    }

    #[test]
    fn test_history_bounded_and_follow_up() {
        let mut cache = create_cache(3);
        let embedder = stub(vec![]);

        assert_eq!(
            cache.follow_up("Can you summarize?"),
            crate::domain::history::NO_CONTEXT_MESSAGE
        );

        // zero vectors never match, so every distinct query is computed
        for i in 1..=6 {
            cache
                .get_or_compute(format!("query {}", i), &embedder, |q| format!("resp {}", q))
                .unwrap();
        }

        assert_eq!(cache.history().len(), 5);
        assert_eq!(
            cache.follow_up("Can you summarize?"),
            "Follow-Up Response: Can you summarize?\n\
             In your previous queries, you asked about: query 2, query 3, query 4, query 5, query 6."
        );
    }

    #[test]
    fn test_try_get_or_compute_dimension_mismatch_skips_compute() {
        let mut cache = create_cache(3);
        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();

        let computed = Cell::new(0);
        let embedder = |_: &String| vec![1.0, 0.0, 0.0];

        let result = cache.get_or_compute(q("B"), &embedder, |_| {
            computed.set(computed.get() + 1);
            q("b")
        });

        assert!(matches!(
            result,
            Err(DomainError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(computed.get(), 0);
        assert!(cache.history().is_empty());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.embeddings().len(), 1);
    }

    #[test]
    fn test_nan_embedding_does_not_block_similar_hit() {
        let mut cache = create_cache(3);
        cache.store(q("bad"), vec![f32::NAN, 0.0], q("nan")).unwrap();
        cache.store(q("good"), vec![1.0, 0.0], q("ok")).unwrap();

        let embedder = stub(vec![("nearly good", vec![1.0, 0.01])]);
        let result = cache.lookup(&q("nearly good"), &embedder);

        assert_eq!(result.response().map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_exact_key_wins_over_earlier_identical_vector() {
        let mut cache = create_cache(3);
        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();
        cache.store(q("B"), vec![1.0, 0.0], q("b")).unwrap();

        let embedder = stub(vec![("B", vec![1.0, 0.0])]);

        // the similarity scan alone would pick A, the earliest identical record
        let found = cache
            .matcher
            .find_best(&[1.0, 0.0], cache.embeddings())
            .map(|m| m.query.clone());
        assert_eq!(found, Some(q("A")));

        match cache.lookup(&q("B"), &embedder) {
            CacheLookup::Hit(hit) => {
                assert_eq!(hit.kind, HitKind::Exact);
                assert_eq!(hit.matched_query, "B");
                assert_eq!(hit.response, "b");
            }
            CacheLookup::Miss { .. } => panic!("expected exact hit"),
        }
    }

    #[test]
    fn test_lookup_response_accessors() {
        let mut cache = create_cache(3);
        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();
        let embedder = stub(vec![]);

        let hit = cache.lookup(&q("A"), &embedder);
        assert_eq!(hit.response(), Some(&q("a")));
        assert_eq!(hit.into_response(), Some(q("a")));

        let miss = cache.lookup(&q("other"), &embedder);
        assert_eq!(miss.response(), None);
        assert_eq!(miss.into_response(), None);
    }

    #[test]
    fn test_reports_configuration() {
        let config = SemanticCacheConfig::new()
            .with_capacity(7)
            .with_similarity_threshold(0.9);
        let cache: QueryCache<String, String> = QueryCache::new(&config).unwrap();

        assert_eq!(cache.capacity(), 7);
        assert_eq!(cache.similarity_threshold(), 0.9);
        assert_eq!(cache.history().max_size(), 5);
    }

    #[test]
    fn test_stats_and_clear() {
        let mut cache = create_cache(2);
        let embedder = stub(vec![("near A", at_cosine(0.95))]);

        cache.store(q("A"), vec![1.0, 0.0], q("a")).unwrap();
        cache.lookup(&q("A"), &embedder);
        cache.lookup(&q("near A"), &embedder);
        cache.lookup(&q("unknown"), &embedder);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.embeddings, 1);
        assert_eq!(stats.exact_hits, 1);
        assert_eq!(stats.similar_hits, 1);
        assert_eq!(stats.misses, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.embeddings().is_empty());
        assert_eq!(cache.stats().exact_hits, 1);
    }
}
