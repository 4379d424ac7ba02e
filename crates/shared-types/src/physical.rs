//! # Physical Model
//!
//! Output of generation and input of building. A physical definition holds
//! only what a builder needs: references to other artifacts are already
//! resolved to `PhysicalId`s, configuration placeholders are substituted and
//! nothing points back into the logical graph.

use crate::entities::{DefinitionKind, PhysicalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A runtime-ready definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalDefinition {
    /// Identity shared with the logical definition that produced it.
    pub id: PhysicalId,
    /// Builder dispatch key.
    pub kind: DefinitionKind,
    pub spec: PhysicalSpec,
}

impl PhysicalDefinition {
    pub fn new(id: PhysicalId, kind: DefinitionKind, spec: PhysicalSpec) -> Self {
        Self { id, kind, spec }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhysicalSpec {
    Component(PhysicalComponent),
    Resource(PhysicalResource),
    Channel(PhysicalChannel),
    Wire(PhysicalWire),
    Binding(PhysicalBinding),
    Extension { config: serde_json::Value },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalComponent {
    pub implementation: String,
    /// Fully resolved property values.
    pub properties: BTreeMap<String, serde_json::Value>,
    pub services: Vec<String>,
    pub references: Vec<String>,
    /// Resource artifacts by the local name the component knows them under.
    pub resources: BTreeMap<String, PhysicalId>,
    pub producers: Vec<PhysicalEndpoint>,
    pub consumers: Vec<PhysicalEndpoint>,
    pub subscriptions: Vec<PhysicalSubscription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalEndpoint {
    pub slot: String,
    pub channel: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalSubscription {
    pub slot: String,
    pub channel: String,
    pub topic: Option<String>,
    /// Stable across redeployments so re-subscription replaces.
    pub subscriber_id: String,
}

/// A resource with its ordered parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalResource {
    pub provider: String,
    pub config: BTreeMap<String, serde_json::Value>,
    /// Insertion order is significant.
    pub parts: Vec<PhysicalResourcePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalResourcePart {
    pub name: String,
    pub provider: String,
    pub config: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalChannel {
    pub name: String,
    pub topics: BTreeSet<String>,
    pub payload: Option<String>,
}

/// A resolved reference-to-service connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalWire {
    pub source: PhysicalId,
    pub reference: String,
    pub target: PhysicalId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalBinding {
    pub transport: String,
    pub component: PhysicalId,
    pub endpoint: Option<String>,
    pub config: BTreeMap<String, serde_json::Value>,
}
