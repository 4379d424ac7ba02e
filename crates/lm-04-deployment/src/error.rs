//! Error types for the deployment orchestrator

use crate::domain::DeploymentId;
use lm_01_federation::FederationError;
use lm_02_generation::GenerationError;
use lm_03_building::BuildError;
use shared_types::{PhysicalId, UnitUri};
use thiserror::Error;

/// Deployment transaction and removal errors.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Federation(#[from] FederationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A build failed. Everything built before it was already removed.
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Unit {unit} is already deployed or being deployed")]
    AlreadyDeployed { unit: UnitUri },

    #[error("Unit {unit} is still imported by {}", join(importers, ", "))]
    UnitInUse {
        unit: UnitUri,
        importers: Vec<UnitUri>,
    },

    #[error("Unknown deployment: {0}")]
    UnknownDeployment(DeploymentId),

    #[error("{definition} depends on '{dependency}', which unit {} does not declare", definition.unit)]
    UnknownDependency {
        definition: PhysicalId,
        dependency: String,
    },

    #[error("Unit {unit} declares '{name}' more than once")]
    DuplicateDefinition { unit: UnitUri, name: String },

    /// Definitions whose ordering edges form a loop. The path starts and
    /// ends with the same definition.
    #[error("Cyclic definition dependency: {}", join(path, " -> "))]
    CyclicDependency { path: Vec<PhysicalId> },

    /// Undeploy finished, but some removals reported failures.
    #[error("Deployment {deployment} removed with {} failure(s): {}", failures.len(), join(failures, "; "))]
    RemovalFailed {
        deployment: DeploymentId,
        failures: Vec<BuildError>,
    },
}

fn join<T: std::fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Result type for deployment operations
pub type DeploymentResult<T> = Result<T, DeploymentError>;
