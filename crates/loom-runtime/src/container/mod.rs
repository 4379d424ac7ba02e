//! # Runtime Container
//!
//! Owns the process-wide services (channels, artifacts, federation graph,
//! registries and endpoint directory) and the orchestrator built over them.
//! Created once at startup and shut down once, undeploying whatever is
//! still deployed.

pub mod config;
pub mod runtime;

pub use config::RuntimeConfig;
pub use runtime::{load_units, Runtime};
