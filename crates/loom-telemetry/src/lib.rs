//! # Loom Telemetry
//!
//! Structured logging and Prometheus metrics for the Loom runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use loom_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOOM_SERVICE_NAME` | `loom` | Service name in the startup log line |
//! | `LOOM_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `LOOM_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LOOM_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::{parse_flag, TelemetryConfig};
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, ARTIFACTS_BUILT,
    ARTIFACTS_REMOVED, BUILD_FAILURES, CHANNELS_OPEN, CHANNEL_EVENTS_PUBLISHED,
    DEFINITIONS_GENERATED, DEPLOYMENTS_ACTIVE, DEPLOYMENTS_COMMITTED, DEPLOYMENT_DURATION,
    DEPLOYMENT_ROLLBACKS, GENERATION_FAILURES, REGISTRY, REMOVE_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install the global log subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
