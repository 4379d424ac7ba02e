use lm_03_building::{Component, ComponentError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Nothing is bound at {address}")]
    UnknownAddress { address: String },

    #[error("Address {address} is already bound")]
    AddressInUse { address: String },

    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Components published by local bindings, keyed by address.
#[derive(Default)]
pub struct EndpointDirectory {
    endpoints: RwLock<BTreeMap<String, Arc<dyn Component>>>,
}

impl EndpointDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, address: &str, component: Arc<dyn Component>) -> Result<(), EndpointError> {
        let mut endpoints = self.endpoints.write();
        if endpoints.contains_key(address) {
            return Err(EndpointError::AddressInUse {
                address: address.to_string(),
            });
        }
        endpoints.insert(address.to_string(), component);
        debug!(address, "Endpoint bound");
        Ok(())
    }

    pub fn unbind(&self, address: &str) -> bool {
        let removed = self.endpoints.write().remove(address).is_some();
        if removed {
            debug!(address, "Endpoint unbound");
        }
        removed
    }

    #[must_use]
    pub fn resolve(&self, address: &str) -> Option<Arc<dyn Component>> {
        self.endpoints.read().get(address).cloned()
    }

    /// Invoke the component bound at `address`. The directory lock is not
    /// held during the call.
    pub fn invoke(&self, address: &str, operation: &str, payload: Value) -> Result<Value, EndpointError> {
        let component = self
            .resolve(address)
            .ok_or_else(|| EndpointError::UnknownAddress {
                address: address.to_string(),
            })?;
        Ok(component.invoke(operation, payload)?)
    }

    /// Bound addresses, sorted.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.endpoints.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for EndpointDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDirectory")
            .field("addresses", &self.addresses())
            .finish()
    }
}
