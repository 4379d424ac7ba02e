use crate::artifacts::{Artifact, ArtifactHandle};
use crate::error::BuilderFault;
use crate::ports::{kind_mismatch, BuildContext, Builder};
use async_trait::async_trait;
use shared_types::{DefinitionKind, PhysicalDefinition, PhysicalSpec};
use tracing::debug;

/// Attaches the target component to the source component's reference
/// proxy.
pub struct WireBuilder;

#[async_trait]
impl Builder for WireBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let PhysicalSpec::Wire(wire) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::wire(), definition));
        };

        let source = ctx
            .artifacts
            .component(&wire.source)
            .ok_or_else(|| BuilderFault::MissingArtifact {
                id: wire.source.clone(),
            })?;
        let proxy = source
            .reference(&wire.reference)
            .ok_or_else(|| BuilderFault::UnknownReference {
                component: wire.source.clone(),
                reference: wire.reference.clone(),
            })?;
        let target = ctx
            .artifacts
            .component(&wire.target)
            .ok_or_else(|| BuilderFault::MissingArtifact {
                id: wire.target.clone(),
            })?;

        proxy.attach(target.component());
        debug!(source = %wire.source, reference = %wire.reference, target = %wire.target, "Wire attached");
        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Link,
        ))
    }

    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        let PhysicalSpec::Wire(wire) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::wire(), definition));
        };

        let proxy = ctx
            .artifacts
            .component(&wire.source)
            .and_then(|source| source.reference(&wire.reference).cloned());
        match proxy {
            Some(proxy) => {
                proxy.detach();
                Ok(())
            }
            None => Err(BuilderFault::MissingArtifact {
                id: wire.source.clone(),
            }),
        }
    }
}
