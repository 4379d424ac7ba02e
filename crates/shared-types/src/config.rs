//! # Configuration Collaborator
//!
//! Generators and builders may ask for configuration values by key. Where
//! the values come from, fallback chains and change listeners belong to the
//! provider, not to the deployment core.

use std::collections::BTreeMap;
use std::env;

/// Source of configuration values.
pub trait ConfigurationProvider: Send + Sync {
    /// Look up a value by dotted key, e.g. `orders.pool.size`.
    fn value(&self, key: &str) -> Option<String>;
}

/// Fixed in-memory values. The default instance is empty.
#[derive(Debug, Clone, Default)]
pub struct MapConfiguration {
    values: BTreeMap<String, String>,
}

impl MapConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigurationProvider for MapConfiguration {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Reads `<PREFIX>_<KEY>` environment variables, with the key upper-cased
/// and `.`/`-` mapped to `_`.
#[derive(Debug, Clone)]
pub struct EnvConfiguration {
    prefix: String,
}

impl EnvConfiguration {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable consulted for `key`.
    #[must_use]
    pub fn variable_name(&self, key: &str) -> String {
        let key = key.to_uppercase().replace(['.', '-'], "_");
        if self.prefix.is_empty() {
            key
        } else {
            format!("{}_{}", self.prefix, key)
        }
    }
}

impl ConfigurationProvider for EnvConfiguration {
    fn value(&self, key: &str) -> Option<String> {
        env::var(self.variable_name(key)).ok()
    }
}
