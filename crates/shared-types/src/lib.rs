//! # Shared Types Crate
//!
//! The declarative model every other Loom crate speaks.
//!
//! ## Layers
//!
//! - **Logical model** (`logical`): units, their import/export declarations and
//!   the polymorphic definitions they contain. Immutable once a deployment
//!   transaction starts generating.
//! - **Physical model** (`physical`): the runtime-ready output of generation.
//!   Carries only what a builder needs and traces back to its logical source
//!   through a `PhysicalId`.
//! - **Identity** (`entities`, `version`): unit URIs, definition kinds and
//!   interval-notation version ranges.
//! - **Configuration port** (`config`): the collaborator generators consult for
//!   externally supplied values.

pub mod config;
pub mod entities;
pub mod errors;
pub mod logical;
pub mod physical;
pub mod version;

pub use config::{ConfigurationProvider, EnvConfiguration, MapConfiguration};
pub use entities::*;
pub use errors::*;
pub use logical::*;
pub use physical::*;
pub use version::{Version, VersionRange};
