//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    init_metrics, record_cache_eviction, record_cache_lookup, record_cache_store, LookupOutcome,
    PrometheusMetrics,
};
