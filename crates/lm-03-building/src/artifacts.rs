//! # Artifact Table
//!
//! Every live artifact, keyed by the physical id it was built from. Shared by
//! all deployments so that wires can reach components of other units.

use crate::component::ComponentInstance;
use crate::resource::Resource;
use parking_lot::RwLock;
use shared_bus::Channel;
use shared_types::{DefinitionKind, PhysicalId};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// The live object behind an artifact.
#[derive(Clone)]
pub enum Artifact {
    Component(Arc<ComponentInstance>),
    Resource(Arc<Resource>),
    Channel(Arc<Channel>),
    /// Connections and other artifacts with no object of their own.
    Link,
    /// Whatever an extension builder produced.
    Custom(Arc<dyn Any + Send + Sync>),
}

/// Handle returned by a successful build.
#[derive(Clone)]
pub struct ArtifactHandle {
    pub id: PhysicalId,
    pub kind: DefinitionKind,
    pub artifact: Artifact,
}

impl ArtifactHandle {
    pub fn new(id: PhysicalId, kind: DefinitionKind, artifact: Artifact) -> Self {
        Self { id, kind, artifact }
    }

    #[must_use]
    pub fn component(&self) -> Option<&Arc<ComponentInstance>> {
        match &self.artifact {
            Artifact::Component(c) => Some(c),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let artifact = match &self.artifact {
            Artifact::Component(_) => "component",
            Artifact::Resource(_) => "resource",
            Artifact::Channel(_) => "channel",
            Artifact::Link => "link",
            Artifact::Custom(_) => "custom",
        };
        f.debug_struct("ArtifactHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("artifact", &artifact)
            .finish()
    }
}

/// Live artifacts by physical id.
#[derive(Default)]
pub struct ArtifactTable {
    artifacts: RwLock<HashMap<PhysicalId, ArtifactHandle>>,
}

impl ArtifactTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: ArtifactHandle) -> Option<ArtifactHandle> {
        self.artifacts.write().insert(handle.id.clone(), handle)
    }

    pub fn remove(&self, id: &PhysicalId) -> Option<ArtifactHandle> {
        self.artifacts.write().remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &PhysicalId) -> Option<ArtifactHandle> {
        self.artifacts.read().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &PhysicalId) -> bool {
        self.artifacts.read().contains_key(id)
    }

    #[must_use]
    pub fn component(&self, id: &PhysicalId) -> Option<Arc<ComponentInstance>> {
        match self.artifacts.read().get(id).map(|h| &h.artifact) {
            Some(Artifact::Component(c)) => Some(Arc::clone(c)),
            _ => None,
        }
    }

    #[must_use]
    pub fn resource(&self, id: &PhysicalId) -> Option<Arc<Resource>> {
        match self.artifacts.read().get(id).map(|h| &h.artifact) {
            Some(Artifact::Resource(r)) => Some(Arc::clone(r)),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }

    /// Ids of all live artifacts, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<PhysicalId> {
        let mut ids: Vec<PhysicalId> = self.artifacts.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
