//! Infrastructure services

mod query_cache;

pub use query_cache::{CacheHit, CacheLookup, HitKind, QueryCache, Resolved, ResponseSource};
