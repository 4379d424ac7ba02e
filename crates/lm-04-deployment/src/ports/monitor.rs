//! Monitor port
//!
//! Receives one structured event per generation failure, build failure and
//! removal, plus transaction-level notifications. Implementations must not
//! block: events are reported inline by the orchestrator.

use crate::domain::DeploymentId;
use shared_types::{DefinitionKind, PhysicalDefinition, UnitUri};
use std::fmt;

/// What happened to a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Generated,
    GenerationFailed,
    Built,
    BuildFailed,
    Removed,
    RemoveFailed,
}

impl Outcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::GenerationFailed => "generation_failed",
            Self::Built => "built",
            Self::BuildFailed => "build_failed",
            Self::Removed => "removed",
            Self::RemoveFailed => "remove_failed",
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed | Self::BuildFailed | Self::RemoveFailed
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured monitor event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub unit: UnitUri,
    pub kind: DefinitionKind,
    pub definition: String,
    pub outcome: Outcome,
    pub error: Option<String>,
}

impl MonitorEvent {
    pub fn new(
        unit: UnitUri,
        kind: DefinitionKind,
        definition: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            unit,
            kind,
            definition: definition.into(),
            outcome,
            error: None,
        }
    }

    /// Event about a physical definition.
    #[must_use]
    pub fn for_physical(definition: &PhysicalDefinition, outcome: Outcome) -> Self {
        Self::new(
            definition.id.unit.clone(),
            definition.kind.clone(),
            definition.id.name.clone(),
            outcome,
        )
    }

    #[must_use]
    pub fn with_error(mut self, error: &dyn std::error::Error) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Receives deployment events.
pub trait DeploymentMonitor: Send + Sync {
    fn record(&self, event: &MonitorEvent);

    fn committed(&self, _deployment: &DeploymentId, _units: usize, _artifacts: usize) {}

    /// Called after compensation finished, before the error is returned.
    fn rolled_back(&self, _deployment: &DeploymentId, _removed: usize) {}

    fn undeployed(&self, _deployment: &DeploymentId, _failures: usize) {}
}
