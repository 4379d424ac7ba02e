//! # lm-02-generation
//!
//! Compiles logical definitions into physical definitions.
//!
//! Dispatch is on the definition's runtime kind through an explicit
//! kind-to-generator map. Extensions add kinds by registering a generator;
//! registering again for a kind replaces the earlier generator.
//!
//! Generation is deterministic and never touches the running system. The
//! only inputs are the definition, its unit, the unit's federation namespace
//! and the configuration collaborator.

pub mod error;
pub mod generators;
pub mod ports;
pub mod properties;
pub mod registry;

pub use error::{GenerationError, GenerationResult, GeneratorFault};
pub use generators::PassthroughGenerator;
pub use ports::{GenerationContext, Generator};
pub use registry::GeneratorRegistry;
