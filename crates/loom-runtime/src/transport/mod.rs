//! # Local Binding Transport
//!
//! In-process transport for `binding.local` definitions. A binding on a
//! service publishes the component under an address in the
//! [`EndpointDirectory`]; a binding on a reference connects that reference
//! to whatever component is published at the configured `target` address.
//!
//! Binding config:
//! - `address`: where to publish (default `local://<unit>/<component>`)
//! - `target`: address a reference binding connects to (required for
//!   reference bindings)

mod directory;
mod local;

pub use directory::{EndpointDirectory, EndpointError};
pub use local::{LocalBindingBuilder, LOCAL_TRANSPORT};
