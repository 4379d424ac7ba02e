//! Error types for generation

use shared_types::{DefinitionKind, UnitUri};
use thiserror::Error;

/// Diagnostic a generator reports about one definition.
///
/// The registry wraps it with the unit, definition and kind it belongs to.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorFault {
    /// Definition handed to a generator for a different kind.
    #[error("expected a '{expected}' definition, found '{found}'")]
    KindMismatch {
        expected: DefinitionKind,
        found: DefinitionKind,
    },

    /// A local name that the unit does not define.
    #[error("unit defines no '{name}'")]
    UnknownDefinition { name: String },

    /// A package the unit does not import.
    #[error("package '{package}' is not imported")]
    UnresolvedImport { package: String },

    /// A symbol the exporting unit does not export.
    #[error("package '{package}' does not export '{symbol}'")]
    UnexportedSymbol { package: String, symbol: String },

    /// `${key}` placeholder without a value or default.
    #[error("no configuration value for '{key}'")]
    MissingConfiguration { key: String },

    /// Any other rejection, with the generator's own diagnostic.
    #[error("{0}")]
    Invalid(String),
}

/// Generation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// No generator registered for the definition's kind.
    #[error("No generator for kind '{kind}' ({unit}#{definition})")]
    NoGenerator {
        unit: UnitUri,
        definition: String,
        kind: DefinitionKind,
    },

    /// The generator rejected the definition.
    #[error("Generation of {unit}#{definition} ({kind}) failed: {fault}")]
    Generation {
        unit: UnitUri,
        definition: String,
        kind: DefinitionKind,
        #[source]
        fault: GeneratorFault,
    },
}

impl GenerationError {
    #[must_use]
    pub fn unit(&self) -> &UnitUri {
        match self {
            Self::NoGenerator { unit, .. } | Self::Generation { unit, .. } => unit,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &str {
        match self {
            Self::NoGenerator { definition, .. } | Self::Generation { definition, .. } => {
                definition
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> &DefinitionKind {
        match self {
            Self::NoGenerator { kind, .. } | Self::Generation { kind, .. } => kind,
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
