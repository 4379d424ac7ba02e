//! # Loom Runtime
//!
//! Process-scoped container over the Loom crates plus the pieces a
//! standalone runtime needs on top of them.
//!
//! ## Modular Structure
//!
//! - `container/` - runtime configuration and the [`Runtime`] container
//! - `components/` - built-in component implementations (`loom.*`)
//! - `transport/` - the in-process `local` binding transport
//!
//! ## Startup Sequence
//!
//! 1. Load [`RuntimeConfig`] from the environment
//! 2. Initialize telemetry
//! 3. Create the [`Runtime`] (registries, builders, built-in components)
//! 4. Load unit descriptors and deploy them as one transaction
//! 5. On shutdown, undeploy everything newest first

pub mod components;
pub mod container;
pub mod transport;

pub use container::runtime::InvokeError;
pub use container::{load_units, Runtime, RuntimeConfig};
pub use transport::{EndpointDirectory, EndpointError, LocalBindingBuilder, LOCAL_TRANSPORT};
