//! # Component Model
//!
//! Components are created by factories registered under an implementation
//! name. Everything a component depends on is handed to its factory through
//! a [`ComponentContext`]: resolved properties, reference proxies, channel
//! handles and opened resources. Nothing is injected afterwards except wire
//! targets, which attach to the reference proxies.

use crate::error::ComponentError;
use crate::resource::Resource;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_bus::{ChannelEvent, ConsumerHandle, ProducerHandle, Subscription};
use shared_types::PhysicalId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A live component.
pub trait Component: Send + Sync {
    /// Handle a service invocation.
    fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError>;

    /// Called once per event on a subscription slot, on the publishing
    /// thread.
    fn on_event(&self, _slot: &str, _event: &ChannelEvent) {}

    /// Called when the component is removed.
    fn stop(&self) {}
}

/// A reference slot. Wires attach a target component; until then every
/// invocation fails with `Unwired`.
#[derive(Clone)]
pub struct ServiceProxy {
    reference: String,
    target: Arc<RwLock<Option<Arc<dyn Component>>>>,
}

impl ServiceProxy {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            target: Arc::new(RwLock::new(None)),
        }
    }

    pub fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
        // Cloned out so the target runs without the proxy lock held.
        let target = self.target.read().clone();
        match target {
            Some(component) => component.invoke(operation, payload),
            None => Err(ComponentError::Unwired {
                reference: self.reference.clone(),
            }),
        }
    }

    pub fn attach(&self, target: Arc<dyn Component>) -> Option<Arc<dyn Component>> {
        self.target.write().replace(target)
    }

    pub fn detach(&self) -> Option<Arc<dyn Component>> {
        self.target.write().take()
    }

    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.target.read().is_some()
    }

    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl std::fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("reference", &self.reference)
            .field("wired", &self.is_wired())
            .finish()
    }
}

/// Constructor arguments of a component.
pub struct ComponentContext {
    pub id: PhysicalId,
    pub properties: BTreeMap<String, Value>,
    references: BTreeMap<String, ServiceProxy>,
    producers: BTreeMap<String, ProducerHandle<Value>>,
    consumers: BTreeMap<String, ConsumerHandle<Value>>,
    resources: BTreeMap<String, Arc<Resource>>,
}

impl ComponentContext {
    pub fn new(id: PhysicalId, properties: BTreeMap<String, Value>) -> Self {
        Self {
            id,
            properties,
            references: BTreeMap::new(),
            producers: BTreeMap::new(),
            consumers: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    pub(crate) fn add_reference(&mut self, proxy: ServiceProxy) {
        self.references.insert(proxy.reference().to_string(), proxy);
    }

    pub(crate) fn add_producer(&mut self, slot: &str, handle: ProducerHandle<Value>) {
        self.producers.insert(slot.to_string(), handle);
    }

    pub(crate) fn add_consumer(&mut self, slot: &str, handle: ConsumerHandle<Value>) {
        self.consumers.insert(slot.to_string(), handle);
    }

    pub(crate) fn add_resource(&mut self, name: &str, resource: Arc<Resource>) {
        self.resources.insert(name.to_string(), resource);
    }

    /// Deserialize a property.
    pub fn property<T: DeserializeOwned>(&self, name: &str) -> Result<T, ComponentError> {
        let value = self
            .properties
            .get(name)
            .ok_or_else(|| ComponentError::Property {
                name: name.to_string(),
                reason: "not set".into(),
            })?;
        serde_json::from_value(value.clone()).map_err(|e| ComponentError::Property {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Deserialize a property, falling back to `default` when it is not set.
    pub fn property_or<T: DeserializeOwned>(
        &self,
        name: &str,
        default: T,
    ) -> Result<T, ComponentError> {
        if self.properties.contains_key(name) {
            self.property(name)
        } else {
            Ok(default)
        }
    }

    pub fn reference(&self, name: &str) -> Result<ServiceProxy, ComponentError> {
        self.references
            .get(name)
            .cloned()
            .ok_or_else(|| ComponentError::Unwired {
                reference: name.to_string(),
            })
    }

    pub fn take_producer(&mut self, slot: &str) -> Option<ProducerHandle<Value>> {
        self.producers.remove(slot)
    }

    pub fn take_consumer(&mut self, slot: &str) -> Option<ConsumerHandle<Value>> {
        self.consumers.remove(slot)
    }

    #[must_use]
    pub fn resource(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources.get(name).cloned()
    }
}

/// Creates components of one implementation.
pub trait ComponentFactory: Send + Sync {
    fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError>;
}

/// Factories keyed by implementation name. Last registration wins.
#[derive(Default)]
pub struct ComponentFactoryRegistry {
    factories: RwLock<HashMap<String, Arc<dyn ComponentFactory>>>,
}

impl ComponentFactoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        implementation: impl Into<String>,
        factory: Arc<dyn ComponentFactory>,
    ) -> Option<Arc<dyn ComponentFactory>> {
        let implementation = implementation.into();
        debug!(implementation = %implementation, "Component factory registered");
        self.factories.write().insert(implementation, factory)
    }

    #[must_use]
    pub fn get(&self, implementation: &str) -> Option<Arc<dyn ComponentFactory>> {
        self.factories.read().get(implementation).cloned()
    }

    #[must_use]
    pub fn implementations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// A built component plus the runtime state its builder owns for it.
pub struct ComponentInstance {
    id: PhysicalId,
    implementation: String,
    component: Arc<dyn Component>,
    services: Vec<String>,
    references: BTreeMap<String, ServiceProxy>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ComponentInstance {
    pub(crate) fn new(
        id: PhysicalId,
        implementation: String,
        component: Arc<dyn Component>,
        services: Vec<String>,
        references: BTreeMap<String, ServiceProxy>,
    ) -> Self {
        Self {
            id,
            implementation,
            component,
            services,
            references,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_subscription(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }

    /// Drop every subscription. Returns how many were held.
    pub(crate) fn release_subscriptions(&self) -> usize {
        let released: Vec<Subscription> = std::mem::take(&mut *self.subscriptions.lock());
        released.len()
    }

    #[must_use]
    pub fn id(&self) -> &PhysicalId {
        &self.id
    }

    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    #[must_use]
    pub fn component(&self) -> Arc<dyn Component> {
        Arc::clone(&self.component)
    }

    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }

    #[must_use]
    pub fn reference(&self, name: &str) -> Option<&ServiceProxy> {
        self.references.get(name)
    }

    pub fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
        self.component.invoke(operation, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Component for Echo {
        fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
            match operation {
                "echo" => Ok(payload),
                other => Err(ComponentError::UnknownOperation {
                    operation: other.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_proxy_wiring() {
        let proxy = ServiceProxy::new("echo");
        assert_eq!(
            proxy.invoke("echo", json!(1)),
            Err(ComponentError::Unwired {
                reference: "echo".into()
            })
        );

        proxy.attach(Arc::new(Echo));
        assert_eq!(proxy.invoke("echo", json!(1)), Ok(json!(1)));

        // Clones share the slot.
        let clone = proxy.clone();
        assert!(proxy.detach().is_some());
        assert!(!clone.is_wired());
    }

    #[test]
    fn test_context_properties() {
        let ctx = ComponentContext::new(
            PhysicalId::new("unit:a".into(), "c"),
            [("size".to_string(), json!(8))].into(),
        );
        assert_eq!(ctx.property::<u32>("size"), Ok(8));
        assert!(matches!(
            ctx.property::<String>("size"),
            Err(ComponentError::Property { .. })
        ));
        assert_eq!(ctx.property_or("missing", 3u32), Ok(3));
        assert!(ctx.reference("pricing").is_err());
    }
}
