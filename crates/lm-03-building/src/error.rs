//! Error types for building

use shared_bus::ChannelError;
use shared_types::{DefinitionKind, PhysicalId};
use thiserror::Error;

/// Errors raised by component code and component proxies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComponentError {
    /// The reference has no wire attached.
    #[error("Reference '{reference}' is not wired")]
    Unwired { reference: String },

    #[error("Unknown operation '{operation}'")]
    UnknownOperation { operation: String },

    /// A property is missing or has the wrong shape.
    #[error("Property '{name}': {reason}")]
    Property { name: String, reason: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("{0}")]
    Failed(String),
}

/// Diagnostic a builder reports about one physical definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuilderFault {
    #[error("expected a '{expected}' definition, found '{found}'")]
    KindMismatch {
        expected: DefinitionKind,
        found: DefinitionKind,
    },

    /// An artifact this one depends on is not built.
    #[error("artifact {id} is not built")]
    MissingArtifact { id: PhysicalId },

    #[error("no component factory for implementation '{implementation}'")]
    UnknownImplementation { implementation: String },

    #[error("no resource provider '{provider}'")]
    UnknownProvider { provider: String },

    #[error("component {component} has no reference '{reference}'")]
    UnknownReference {
        component: PhysicalId,
        reference: String,
    },

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("{0}")]
    Failed(String),
}

/// Build errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// No builder registered for the physical kind.
    #[error("No builder for kind '{kind}' ({id})")]
    NoBuilder { id: PhysicalId, kind: DefinitionKind },

    #[error("Build of {id} ({kind}) failed: {fault}")]
    Build {
        id: PhysicalId,
        kind: DefinitionKind,
        #[source]
        fault: BuilderFault,
    },

    #[error("Removal of {id} ({kind}) failed: {fault}")]
    Remove {
        id: PhysicalId,
        kind: DefinitionKind,
        #[source]
        fault: BuilderFault,
    },
}

impl BuildError {
    #[must_use]
    pub fn id(&self) -> &PhysicalId {
        match self {
            Self::NoBuilder { id, .. } | Self::Build { id, .. } | Self::Remove { id, .. } => id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &DefinitionKind {
        match self {
            Self::NoBuilder { kind, .. } | Self::Build { kind, .. } | Self::Remove { kind, .. } => {
                kind
            }
        }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
