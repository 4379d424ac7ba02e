//! Deployment domain: receipts and definition ordering.

pub mod deployment;
pub mod ordering;

pub use deployment::{Deployment, DeploymentId, DeploymentSummary};
pub use ordering::{order_definitions, DefinitionRef};
