//! # Runtime Configuration
//!
//! Everything the runtime container reads at startup. All settings have
//! defaults and can be overridden through `LOOM_*` environment variables.

use loom_telemetry::{parse_flag, TelemetryConfig};
use std::env;

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
    /// Prefix of the environment variables `${key}` placeholders read from.
    pub config_prefix: String,
    /// Refuse to undeploy units that other deployments still import from.
    pub refuse_in_use: bool,
    /// Register the `loom.*` component implementations.
    pub builtin_components: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            telemetry: TelemetryConfig::default(),
            config_prefix: "LOOM".to_string(),
            refuse_in_use: true,
            builtin_components: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOOM_CONFIG_PREFIX`: placeholder variable prefix (default: LOOM)
    /// - `LOOM_REFUSE_IN_USE`: guard imported units on undeploy (default: true)
    /// - `LOOM_BUILTIN_COMPONENTS`: register built-in components (default: true)
    ///
    /// Telemetry variables are documented on [`TelemetryConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            telemetry: TelemetryConfig::from_env(),
            config_prefix: env::var("LOOM_CONFIG_PREFIX").unwrap_or(defaults.config_prefix),
            refuse_in_use: env::var("LOOM_REFUSE_IN_USE")
                .map(|v| parse_flag(&v, defaults.refuse_in_use))
                .unwrap_or(defaults.refuse_in_use),
            builtin_components: env::var("LOOM_BUILTIN_COMPONENTS")
                .map(|v| parse_flag(&v, defaults.builtin_components))
                .unwrap_or(defaults.builtin_components),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.config_prefix, "LOOM");
        assert!(config.refuse_in_use);
        assert!(config.builtin_components);
        assert_eq!(config.telemetry.service_name, "loom");
    }

    #[test]
    fn test_from_env_overrides() {
        env::set_var("LOOM_CONFIG_PREFIX", "APP");
        env::set_var("LOOM_REFUSE_IN_USE", "no");
        let config = RuntimeConfig::from_env();
        env::remove_var("LOOM_CONFIG_PREFIX");
        env::remove_var("LOOM_REFUSE_IN_USE");

        assert_eq!(config.config_prefix, "APP");
        assert!(!config.refuse_in_use);
        assert!(config.builtin_components);
    }
}
