//! Telemetry module for the Regflow Validation Agent
//!
//! - `metrics` - Prometheus metrics for validations and ledger activity
//! - [`init_tracing`] - subscriber setup shared by the CLI and the server

pub mod metrics;

pub use metrics::{ValidationMetrics, ValidationMetricsRegistry, ValidationTimer};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Logging setup error: {0}")]
    LoggingError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.level`. Fails if a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| TelemetryError::LoggingError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| TelemetryError::LoggingError(e.to_string()))
}
