//! # Identity Types
//!
//! Identifiers shared by the logical and physical models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a deployable unit.
///
/// Ordering is lexicographic and is the documented tie-break when two
/// exporters offer the same package at the same version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitUri(String);

impl UnitUri {
    /// Create a URI from any string-like value.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Borrow the URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitUri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UnitUri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Runtime discriminant used to dispatch a definition to its generator or
/// builder.
///
/// Kinds are open-ended: extensions introduce new ones simply by registering
/// handlers for them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionKind(String);

impl DefinitionKind {
    pub const COMPONENT: &'static str = "component";
    pub const RESOURCE: &'static str = "resource";
    pub const CHANNEL: &'static str = "channel";
    pub const WIRE: &'static str = "wire";
    pub const BINDING: &'static str = "binding";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    #[must_use]
    pub fn component() -> Self {
        Self::new(Self::COMPONENT)
    }

    #[must_use]
    pub fn resource() -> Self {
        Self::new(Self::RESOURCE)
    }

    #[must_use]
    pub fn channel() -> Self {
        Self::new(Self::CHANNEL)
    }

    #[must_use]
    pub fn wire() -> Self {
        Self::new(Self::WIRE)
    }

    /// Logical kind shared by every binding definition.
    #[must_use]
    pub fn binding() -> Self {
        Self::new(Self::BINDING)
    }

    /// Physical kind of a binding attached through `transport`,
    /// e.g. `binding.http`.
    #[must_use]
    pub fn transport(transport: &str) -> Self {
        Self(format!("{}.{}", Self::BINDING, transport))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefinitionKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a physical definition and of the artifact built from it.
///
/// Names are unique within a unit, so `(unit, name)` traces every physical
/// definition to exactly one logical definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalId {
    pub unit: UnitUri,
    pub name: String,
}

impl PhysicalId {
    pub fn new(unit: UnitUri, name: impl Into<String>) -> Self {
        Self {
            unit,
            name: name.into(),
        }
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.unit, self.name)
    }
}
