//! Cache domain - Exact-match tier of the query cache

mod lru;

pub use lru::{ExactCache, Iter};
