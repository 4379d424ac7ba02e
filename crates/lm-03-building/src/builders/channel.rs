use crate::artifacts::{Artifact, ArtifactHandle};
use crate::error::BuilderFault;
use crate::ports::{kind_mismatch, BuildContext, Builder};
use async_trait::async_trait;
use shared_bus::ChannelDeclaration;
use shared_types::{DefinitionKind, PhysicalDefinition, PhysicalSpec};
use tracing::warn;

/// Declares a channel owned by the building deployment; removal closes it
/// and every handle on it.
pub struct ChannelBuilder;

#[async_trait]
impl Builder for ChannelBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let PhysicalSpec::Channel(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::channel(), definition));
        };

        let channel = ctx.channels.declare(ChannelDeclaration {
            name: spec.name.clone(),
            topics: spec.topics.clone(),
            owner: ctx.deployment.clone(),
        })?;
        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Channel(channel),
        ))
    }

    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        let PhysicalSpec::Channel(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::channel(), definition));
        };

        let Some(channel) = ctx.channels.get(&spec.name) else {
            warn!(channel = %spec.name, "Channel already gone");
            return Ok(());
        };
        match channel.owner() {
            Some(owner) if owner == ctx.deployment => {
                ctx.channels.close_channel(&spec.name);
                Ok(())
            }
            owner => Err(BuilderFault::Failed(format!(
                "channel '{}' is owned by {}, not {}",
                spec.name,
                owner.as_deref().unwrap_or("nobody"),
                ctx.deployment
            ))),
        }
    }
}
