//! # Resources
//!
//! Shared objects such as pools or configuration blocks, opened by named
//! providers. A resource may aggregate ordered parts: parts open in
//! declaration order after the root and close in reverse before it.

use crate::error::BuilderFault;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::PhysicalId;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Opaque value a provider hands out.
pub type ResourceValue = Arc<dyn Any + Send + Sync>;

/// Opens and closes resources of one provider type.
pub trait ResourceProvider: Send + Sync {
    fn open(&self, name: &str, config: &BTreeMap<String, Value>) -> Result<ResourceValue, BuilderFault>;

    fn close(&self, _name: &str, _value: &ResourceValue) -> Result<(), BuilderFault> {
        Ok(())
    }
}

/// One opened resource or resource part.
#[derive(Clone)]
pub struct OpenResource {
    pub name: String,
    pub provider: String,
    pub value: ResourceValue,
}

impl OpenResource {
    /// The provider value as `T`, if that is what the provider produced.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

/// A built resource with its parts in open order.
pub struct Resource {
    pub id: PhysicalId,
    pub root: OpenResource,
    pub parts: Vec<OpenResource>,
}

impl Resource {
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&OpenResource> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Root value as `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.root.downcast()
    }
}

/// Providers keyed by name.
#[derive(Default)]
pub struct ResourceProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn ResourceProvider>>>,
}

impl ResourceProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `config` provider.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(ConfigProvider::NAME, Arc::new(ConfigProvider));
        registry
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Option<Arc<dyn ResourceProvider>> {
        let name = name.into();
        debug!(provider = %name, "Resource provider registered");
        self.providers.write().insert(name, provider)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ResourceProvider>, BuilderFault> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BuilderFault::UnknownProvider {
                provider: name.to_string(),
            })
    }
}

/// Built-in provider whose value is the configuration map itself.
pub struct ConfigProvider;

impl ConfigProvider {
    pub const NAME: &'static str = "config";
}

impl ResourceProvider for ConfigProvider {
    fn open(&self, _name: &str, config: &BTreeMap<String, Value>) -> Result<ResourceValue, BuilderFault> {
        Ok(Arc::new(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_provider_value() {
        let registry = ResourceProviderRegistry::with_defaults();
        let provider = registry.get("config").unwrap();
        let config: BTreeMap<String, Value> = [("url".to_string(), json!("mem://"))].into();

        let value = provider.open("db", &config).unwrap();
        let open = OpenResource {
            name: "db".into(),
            provider: "config".into(),
            value,
        };
        let map = open.downcast::<BTreeMap<String, Value>>().unwrap();
        assert_eq!(map["url"], json!("mem://"));
        assert!(open.downcast::<String>().is_none());
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ResourceProviderRegistry::new();
        assert_eq!(
            registry.get("pool").err(),
            Some(BuilderFault::UnknownProvider {
                provider: "pool".into()
            })
        );
    }
}
