//! # Builder Registry
//!
//! Mirrors the generator registry for physical definitions. Successful
//! builds are recorded in the artifact table; removals take them out again.
//! No registry lock is held while a builder runs.

use crate::artifacts::ArtifactHandle;
use crate::builders;
use crate::error::{BuildError, BuildResult};
use crate::ports::{BuildContext, Builder};
use parking_lot::RwLock;
use shared_types::{DefinitionKind, PhysicalDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builders keyed by physical definition kind.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: RwLock<HashMap<DefinitionKind, Arc<dyn Builder>>>,
}

impl BuilderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the component, resource, channel and wire
    /// builders. Binding kinds are left to transport collaborators.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        builders::register_defaults(&registry);
        registry
    }

    /// Associate `kind` with `builder`, replacing and returning any earlier
    /// builder for it.
    pub fn register(&self, kind: DefinitionKind, builder: Arc<dyn Builder>) -> Option<Arc<dyn Builder>> {
        let previous = self.builders.write().insert(kind.clone(), builder);
        if previous.is_some() {
            info!(kind = %kind, "Builder replaced");
        } else {
            debug!(kind = %kind, "Builder registered");
        }
        previous
    }

    #[must_use]
    pub fn contains(&self, kind: &DefinitionKind) -> bool {
        self.builders.read().contains_key(kind)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<DefinitionKind> {
        let mut kinds: Vec<DefinitionKind> = self.builders.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    fn builder_for(&self, definition: &PhysicalDefinition) -> BuildResult<Arc<dyn Builder>> {
        self.builders
            .read()
            .get(&definition.kind)
            .cloned()
            .ok_or_else(|| BuildError::NoBuilder {
                id: definition.id.clone(),
                kind: definition.kind.clone(),
            })
    }

    /// Build `definition` and record the artifact.
    pub async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> BuildResult<ArtifactHandle> {
        let builder = self.builder_for(definition)?;
        let handle = builder
            .build(definition, ctx)
            .await
            .map_err(|fault| BuildError::Build {
                id: definition.id.clone(),
                kind: definition.kind.clone(),
                fault,
            })?;

        if ctx.artifacts.insert(handle.clone()).is_some() {
            warn!(id = %definition.id, "Artifact replaced an existing one with the same id");
        }
        debug!(
            id = %definition.id,
            kind = %definition.kind,
            deployment = %ctx.deployment,
            "Artifact built"
        );
        Ok(handle)
    }

    /// Tear `definition` down. The artifact leaves the table even when the
    /// builder reports a failure.
    pub async fn remove(&self, definition: &PhysicalDefinition, ctx: &BuildContext) -> BuildResult<()> {
        let builder = self.builder_for(definition)?;
        let outcome = builder.remove(definition, ctx).await;
        ctx.artifacts.remove(&definition.id);

        outcome.map_err(|fault| BuildError::Remove {
            id: definition.id.clone(),
            kind: definition.kind.clone(),
            fault,
        })?;
        debug!(
            id = %definition.id,
            kind = %definition.kind,
            deployment = %ctx.deployment,
            "Artifact removed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
