//! Telemetry configuration from environment variables.

use std::env;

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression)
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "loom".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOOM_SERVICE_NAME`: Service name (default: loom)
    /// - `LOOM_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `LOOM_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `LOOM_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("LOOM_SERVICE_NAME").unwrap_or_else(|_| "loom".to_string()),

            log_level: env::var("LOOM_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("LOOM_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("LOOM_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),
        }
    }
}

/// `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitive; anything else
/// yields `default`.
pub fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}
