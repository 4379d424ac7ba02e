use super::directory::EndpointDirectory;
use async_trait::async_trait;
use lm_03_building::{Artifact, ArtifactHandle, BuildContext, Builder, BuilderFault};
use shared_types::{DefinitionKind, PhysicalBinding, PhysicalDefinition, PhysicalSpec};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transport name; bindings of this transport have kind `binding.local`.
pub const LOCAL_TRANSPORT: &str = "local";

/// What a local binding did, kept as the binding's artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalEndpoint {
    /// The component is reachable at `address`.
    Published { address: String },
    /// The component's `reference` calls whatever is bound at `target`.
    Connected { reference: String, target: String },
}

/// Builds `binding.local` definitions against an [`EndpointDirectory`].
pub struct LocalBindingBuilder {
    directory: Arc<EndpointDirectory>,
}

impl LocalBindingBuilder {
    pub fn new(directory: Arc<EndpointDirectory>) -> Self {
        Self { directory }
    }

    #[must_use]
    pub fn kind() -> DefinitionKind {
        DefinitionKind::transport(LOCAL_TRANSPORT)
    }

    fn binding(definition: &PhysicalDefinition) -> Result<&PhysicalBinding, BuilderFault> {
        match &definition.spec {
            PhysicalSpec::Binding(binding) if binding.transport == LOCAL_TRANSPORT => Ok(binding),
            _ => Err(BuilderFault::KindMismatch {
                expected: Self::kind(),
                found: definition.kind.clone(),
            }),
        }
    }
}

fn config_text(binding: &PhysicalBinding, key: &str) -> Result<Option<String>, BuilderFault> {
    match binding.config.get(key) {
        None => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(BuilderFault::Failed(format!(
            "binding config '{key}' must be a string, got {other}"
        ))),
    }
}

fn address_of(binding: &PhysicalBinding) -> Result<String, BuilderFault> {
    if let Some(address) = config_text(binding, "address")? {
        return Ok(address);
    }
    let component = &binding.component;
    Ok(match &binding.endpoint {
        Some(endpoint) => format!("local://{}/{}/{}", component.unit, component.name, endpoint),
        None => format!("local://{}/{}", component.unit, component.name),
    })
}

#[async_trait]
impl Builder for LocalBindingBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let binding = Self::binding(definition)?;
        let instance = ctx
            .artifacts
            .component(&binding.component)
            .ok_or_else(|| BuilderFault::MissingArtifact {
                id: binding.component.clone(),
            })?;

        let reference = binding
            .endpoint
            .as_deref()
            .and_then(|name| instance.reference(name));
        let endpoint = match reference {
            Some(proxy) => {
                let target = config_text(binding, "target")?.ok_or_else(|| {
                    BuilderFault::Failed(format!(
                        "reference binding '{}' needs a 'target' address",
                        definition.id
                    ))
                })?;
                let component = self.directory.resolve(&target).ok_or_else(|| {
                    BuilderFault::Failed(format!("nothing is bound at {target}"))
                })?;
                proxy.attach(component);
                debug!(id = %definition.id, reference = proxy.reference(), target = %target, "Reference connected");
                LocalEndpoint::Connected {
                    reference: proxy.reference().to_string(),
                    target,
                }
            }
            None => {
                let address = address_of(binding)?;
                self.directory
                    .bind(&address, instance.component())
                    .map_err(|e| BuilderFault::Failed(e.to_string()))?;
                LocalEndpoint::Published { address }
            }
        };

        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Custom(Arc::new(endpoint)),
        ))
    }

    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        let binding = Self::binding(definition)?;
        let Some(handle) = ctx.artifacts.get(&definition.id) else {
            warn!(id = %definition.id, "Binding already gone");
            return Ok(());
        };
        let endpoint = match &handle.artifact {
            Artifact::Custom(value) => Arc::clone(value).downcast::<LocalEndpoint>().ok(),
            _ => None,
        };

        match endpoint.as_deref() {
            Some(LocalEndpoint::Published { address }) => {
                if !self.directory.unbind(address) {
                    warn!(address = %address, "Endpoint was not bound");
                }
                Ok(())
            }
            Some(LocalEndpoint::Connected { reference, .. }) => {
                if let Some(proxy) = ctx
                    .artifacts
                    .component(&binding.component)
                    .and_then(|c| c.reference(reference).cloned())
                {
                    proxy.detach();
                }
                Ok(())
            }
            None => Err(BuilderFault::Failed(format!(
                "artifact of {} is not a local endpoint",
                definition.id
            ))),
        }
    }
}
