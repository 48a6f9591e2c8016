//! Infrastructure layer - Cache service, logging, and metrics

pub mod logging;
pub mod observability;
pub mod services;
