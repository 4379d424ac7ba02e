use crate::artifacts::{Artifact, ArtifactHandle};
use crate::error::BuilderFault;
use crate::ports::{kind_mismatch, BuildContext, Builder};
use crate::resource::{OpenResource, Resource};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{DefinitionKind, PhysicalDefinition, PhysicalSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the root resource, then each part in order. A part that fails to
/// open closes everything opened before it.
pub struct ResourceBuilder;

fn open(
    ctx: &BuildContext,
    name: &str,
    provider: &str,
    config: &BTreeMap<String, Value>,
) -> Result<OpenResource, BuilderFault> {
    let value = ctx.resources.get(provider)?.open(name, config)?;
    Ok(OpenResource {
        name: name.to_string(),
        provider: provider.to_string(),
        value,
    })
}

/// Close parts in reverse, then the root. Every close is attempted; the
/// first failure is returned.
fn close_all(ctx: &BuildContext, root: &OpenResource, parts: &[OpenResource]) -> Result<(), BuilderFault> {
    let mut first_error = None;
    for opened in parts.iter().rev().chain(std::iter::once(root)) {
        let closed = ctx
            .resources
            .get(&opened.provider)
            .and_then(|p| p.close(&opened.name, &opened.value));
        if let Err(fault) = closed {
            warn!(resource = %opened.name, provider = %opened.provider, error = %fault, "Resource close failed");
            first_error.get_or_insert(fault);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[async_trait]
impl Builder for ResourceBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let PhysicalSpec::Resource(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::resource(), definition));
        };

        let root = open(ctx, &definition.id.name, &spec.provider, &spec.config)?;
        let mut parts = Vec::with_capacity(spec.parts.len());
        for part in &spec.parts {
            match open(ctx, &part.name, &part.provider, &part.config) {
                Ok(opened) => parts.push(opened),
                Err(fault) => {
                    // The open failure wins over any unwind error.
                    if let Err(e) = close_all(ctx, &root, &parts) {
                        debug!(id = %definition.id, error = %e, "Unwind after failed part open");
                    }
                    return Err(fault);
                }
            }
        }

        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Resource(Arc::new(Resource {
                id: definition.id.clone(),
                root,
                parts,
            })),
        ))
    }

    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        let resource = ctx
            .artifacts
            .resource(&definition.id)
            .ok_or_else(|| BuilderFault::MissingArtifact {
                id: definition.id.clone(),
            })?;
        close_all(ctx, &resource.root, &resource.parts)
    }
}
