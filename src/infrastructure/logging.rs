//! Global tracing subscriber setup

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Fails if a global subscriber
/// is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let json = config.format == LogFormat::Json;

    let json_layer = json.then(|| fmt::layer().json().flatten_event(true));
    let pretty_layer = (!json).then(|| fmt::layer().pretty().with_target(true));

    tracing_subscriber::registry()
        .with(level_filter(&config.level))
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();

        // another test may already have installed a subscriber
        let _ = init_logging(&config);

        assert!(init_logging(&config).is_err());
    }
}
