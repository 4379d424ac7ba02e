//! # lm-01-federation
//!
//! Module federation: every deployed unit gets its own namespace, and
//! cross-unit visibility exists only through explicit federation wires.
//!
//! ## Overview
//!
//! - **Resolution**: for each import, pick the exporter with the highest
//!   version inside the requested range. Ties go to the lowest unit URI.
//! - **Cycle detection**: depth-first walk over importer -> exporter edges,
//!   reporting the full loop.
//! - **Graph**: installed units and attached wires, mutated only when a
//!   deployment builds or removes wires.
//!
//! ```text
//!  unit:app ──imports "pricing"──→ unit:lib (1.5)
//!      │                               │
//!      └── Namespace ── lookup ──→ exported symbols
//! ```

pub mod domain;
pub mod error;

pub use domain::{
    resolve, FederationGraph, FederationWire, ImportedPackage, Namespace, Resolution,
};
pub use error::{FederationError, FederationResult};
