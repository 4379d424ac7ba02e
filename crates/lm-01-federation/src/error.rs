//! Error types for module federation

use shared_types::UnitUri;
use thiserror::Error;

/// Federation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FederationError {
    /// No installed or proposed unit exports the package in the requested
    /// range.
    #[error("Unit {unit} imports '{package}' ({range}) but no unit exports it in that range")]
    UnresolvedImport {
        unit: UnitUri,
        package: String,
        range: String,
    },

    /// Import edges form a loop. `path` starts and ends with the same unit.
    #[error("Cyclic unit dependency: {}", format_path(path))]
    CyclicDependency { path: Vec<UnitUri> },

    /// A proposed unit is already installed or proposed twice.
    #[error("Unit {unit} is already installed")]
    DuplicateUnit { unit: UnitUri },
}

fn format_path(path: &[UnitUri]) -> String {
    path.iter()
        .map(UnitUri::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for federation operations
pub type FederationResult<T> = Result<T, FederationError>;
