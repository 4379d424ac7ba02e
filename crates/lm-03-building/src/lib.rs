//! # lm-03-building
//!
//! Materializes physical definitions as live artifacts and tears them down.
//!
//! ## Overview
//!
//! - **Builder registry**: kind-to-builder map, mirrored on the generator
//!   registry. Builders run without any registry lock held and may block.
//! - **Artifact table**: live artifacts by physical id, shared by every
//!   deployment so wires can cross unit boundaries.
//! - **Component model**: factories receive all collaborators through a
//!   `ComponentContext` at construction; wires fill reference proxies later.
//! - **Resources**: provider-opened values with ordered parts.
//!
//! ```text
//! PhysicalDefinition ──kind──→ Builder ──build──→ ArtifactHandle ──→ ArtifactTable
//!                                  └────remove───→ (artifact dropped from table)
//! ```

pub mod artifacts;
pub mod builders;
pub mod component;
pub mod error;
pub mod ports;
pub mod registry;
pub mod resource;

pub use artifacts::{Artifact, ArtifactHandle, ArtifactTable};
pub use component::{
    Component, ComponentContext, ComponentFactory, ComponentFactoryRegistry, ComponentInstance,
    ServiceProxy,
};
pub use error::{BuildError, BuildResult, BuilderFault, ComponentError};
pub use ports::{BuildContext, Builder};
pub use registry::BuilderRegistry;
pub use resource::{
    ConfigProvider, OpenResource, Resource, ResourceProvider, ResourceProviderRegistry,
    ResourceValue,
};
