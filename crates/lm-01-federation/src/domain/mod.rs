//! Federation domain: wires, namespaces, resolution and the committed graph.

pub mod graph;
pub mod resolver;
pub mod wire;

pub use graph::FederationGraph;
pub use resolver::{resolve, Resolution};
pub use wire::{FederationWire, ImportedPackage, Namespace};
