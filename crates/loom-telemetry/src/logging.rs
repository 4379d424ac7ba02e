//! Structured logging setup.
//!
//! One `tracing-subscriber` registry with an `EnvFilter` and either a human
//! or a JSON formatting layer. Every crate logs through `tracing` macros
//! with the fields `unit`, `definition`, `kind`, `channel` and `deployment`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already
/// installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level '{}': {e}", config.log_level)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if !config.console_output {
        registry
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        registry
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true);
        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        let config = TelemetryConfig {
            log_level: "loom=[".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(TelemetryError::Config(_))));
    }
}
