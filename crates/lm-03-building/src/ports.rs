//! Builder extension point

use crate::artifacts::{ArtifactHandle, ArtifactTable};
use crate::component::ComponentFactoryRegistry;
use crate::error::BuilderFault;
use crate::resource::ResourceProviderRegistry;
use async_trait::async_trait;
use lm_01_federation::FederationGraph;
use shared_bus::ChannelRuntime;
use shared_types::{DefinitionKind, PhysicalDefinition};
use std::sync::Arc;

/// Process-wide state a builder may act on, plus the deployment it builds
/// for.
#[derive(Clone)]
pub struct BuildContext {
    /// Deployment that owns what is built. Channels record it as owner.
    pub deployment: String,
    pub channels: Arc<ChannelRuntime>,
    pub artifacts: Arc<ArtifactTable>,
    pub federation: Arc<FederationGraph>,
    pub components: Arc<ComponentFactoryRegistry>,
    pub resources: Arc<ResourceProviderRegistry>,
}

impl BuildContext {
    /// Fresh, empty services with the default resource providers.
    pub fn new(deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            channels: Arc::new(ChannelRuntime::new()),
            artifacts: Arc::new(ArtifactTable::new()),
            federation: Arc::new(FederationGraph::new()),
            components: Arc::new(ComponentFactoryRegistry::new()),
            resources: Arc::new(ResourceProviderRegistry::with_defaults()),
        }
    }

    /// The same services on behalf of another deployment.
    #[must_use]
    pub fn for_deployment(&self, deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            ..self.clone()
        }
    }
}

/// Materializes and tears down artifacts of one kind.
///
/// A failed build must leave nothing behind. Builders need not be
/// idempotent: the orchestrator builds each definition at most once and
/// removes it at most once.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault>;

    /// Called while the artifact is still in the artifact table.
    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault>;
}

pub(crate) fn kind_mismatch(expected: DefinitionKind, definition: &PhysicalDefinition) -> BuilderFault {
    BuilderFault::KindMismatch {
        expected,
        found: definition.kind.clone(),
    }
}
