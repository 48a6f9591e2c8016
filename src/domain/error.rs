use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid capacity: {capacity} (must be zero or positive)")]
    InvalidCapacity { capacity: i64 },

    #[error("Invalid similarity threshold: {threshold} (must be in (0, 1])")]
    InvalidThreshold { threshold: f32 },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn invalid_capacity(capacity: i64) -> Self {
        Self::InvalidCapacity { capacity }
    }

    pub fn invalid_threshold(threshold: f32) -> Self {
        Self::InvalidThreshold { threshold }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for DomainError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
