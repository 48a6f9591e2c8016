//! Prometheus metrics infrastructure

use std::sync::Arc;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for rendering the exposition text
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics in Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
///
/// Without an installed recorder every `record_*` call is a no-op.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_default_metrics();

            tracing::info!("Prometheus metrics recorder installed");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn register_default_metrics() {
    gauge!("query_cache_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// How a lookup was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served by key equality
    Exact,
    /// Served through a similar stored query
    Similar,
    /// Similar query found but its entry was gone
    Stale,
    /// Nothing found
    Miss,
}

impl LookupOutcome {
    /// Label value used on the lookup counter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Similar => "similar",
            Self::Stale => "stale",
            Self::Miss => "miss",
        }
    }
}

/// Record a cache lookup
pub fn record_cache_lookup(outcome: LookupOutcome) {
    counter!("query_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record a stored response
pub fn record_cache_store() {
    counter!("query_cache_stores_total").increment(1);
}

/// Record an exact-tier eviction
pub fn record_cache_eviction() {
    counter!("query_cache_evictions_total").increment(1);
}
