//! Committed deployments

use lm_01_federation::FederationWire;
use serde::{Deserialize, Serialize};
use shared_types::{PhysicalDefinition, UnitUri};
use std::fmt;
use std::time::SystemTime;
use uuid::Uuid;

/// Receipt for a committed deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeploymentId(Uuid);

impl DeploymentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to undo a deployment.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub id: DeploymentId,
    /// Units in the order they were proposed.
    pub units: Vec<UnitUri>,
    /// Physical definitions in build order. Removal walks this backwards.
    pub definitions: Vec<PhysicalDefinition>,
    /// Federation wires this deployment attached.
    pub wires: Vec<FederationWire>,
    pub deployed_at: SystemTime,
}

impl Deployment {
    #[must_use]
    pub fn summary(&self) -> DeploymentSummary {
        DeploymentSummary {
            id: self.id,
            units: self.units.clone(),
            artifacts: self.definitions.len(),
            wires: self.wires.len(),
            deployed_at: self.deployed_at,
        }
    }
}

/// Read-only view of a deployment for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub id: DeploymentId,
    pub units: Vec<UnitUri>,
    pub artifacts: usize,
    pub wires: usize,
    pub deployed_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(DeploymentId::new(), DeploymentId::new());
    }

    #[test]
    fn test_id_serde() {
        let id = DeploymentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
