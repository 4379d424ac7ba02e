//! # Error Types
//!
//! Errors raised while parsing or loading the declarative model.

use thiserror::Error;

/// Errors from version and version-range parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    /// Not a `major[.minor[.patch]]` version string.
    #[error("Invalid version: '{0}'")]
    InvalidVersion(String),

    /// Malformed interval notation.
    #[error("Invalid version range: '{0}'")]
    InvalidRange(String),

    /// Interval whose floor lies above its ceiling.
    #[error("Version range admits no version: '{0}'")]
    EmptyRange(String),
}

/// Errors from loading a unit descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The document is not a valid unit description.
    #[error("Malformed unit descriptor: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two definitions in one unit share a name.
    #[error("Unit {unit} declares '{name}' more than once")]
    DuplicateDefinition { unit: String, name: String },
}
