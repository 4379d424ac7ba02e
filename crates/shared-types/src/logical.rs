//! # Logical Model
//!
//! The declarative graph a deployment starts from. A `LogicalUnit` owns its
//! definitions exclusively and declares which packages it exports to, and
//! imports from, other units.
//!
//! Definitions are a tagged variant. Dispatch to generators happens on the
//! runtime `DefinitionKind` returned by [`LogicalDefinition::kind`], so new
//! kinds arrive through [`DefinitionSpec::Extension`] without touching this
//! crate.

use crate::entities::{DefinitionKind, UnitUri};
use crate::errors::DescriptorError;
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// An independently deployable bundle of definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalUnit {
    pub uri: UnitUri,
    pub version: Version,
    #[serde(default)]
    pub exports: Vec<ExportDeclaration>,
    #[serde(default)]
    pub imports: Vec<ImportDeclaration>,
    #[serde(default)]
    pub definitions: Vec<LogicalDefinition>,
}

/// A package made visible to other units, with the definition names it
/// carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDeclaration {
    pub package: String,
    #[serde(default)]
    pub symbols: BTreeSet<String>,
}

/// A package this unit needs from some other unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDeclaration {
    pub package: String,
    #[serde(default = "VersionRange::any")]
    pub range: VersionRange,
}

impl LogicalUnit {
    pub fn new(uri: impl Into<UnitUri>, version: Version) -> Self {
        Self {
            uri: uri.into(),
            version,
            exports: Vec::new(),
            imports: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Parse a JSON unit descriptor and check name uniqueness.
    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        let unit: Self = serde_json::from_str(text)?;
        unit.validate()?;
        Ok(unit)
    }

    /// Check that definition names are unique within the unit.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if !seen.insert(definition.name.as_str()) {
                return Err(DescriptorError::DuplicateDefinition {
                    unit: self.uri.to_string(),
                    name: definition.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Export `package` carrying `symbols`.
    #[must_use]
    pub fn exporting<I, S>(mut self, package: impl Into<String>, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports.push(ExportDeclaration {
            package: package.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Import `package` from any unit whose version lies in `range`.
    #[must_use]
    pub fn importing(mut self, package: impl Into<String>, range: VersionRange) -> Self {
        self.imports.push(ImportDeclaration {
            package: package.into(),
            range,
        });
        self
    }

    /// Add a definition.
    #[must_use]
    pub fn with_definition(mut self, definition: LogicalDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    #[must_use]
    pub fn exports_package(&self, package: &str) -> bool {
        self.exports.iter().any(|e| e.package == package)
    }

    /// Symbols carried by `package`, if this unit exports it.
    #[must_use]
    pub fn exported_symbols(&self, package: &str) -> Option<&BTreeSet<String>> {
        self.exports
            .iter()
            .find(|e| e.package == package)
            .map(|e| &e.symbols)
    }

    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&LogicalDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Names of the channels this unit declares.
    pub fn declared_channels(&self) -> impl Iterator<Item = &str> {
        self.definitions
            .iter()
            .filter(|d| matches!(d.spec, DefinitionSpec::Channel(_)))
            .map(|d| d.name.as_str())
    }
}

/// A node of the logical graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalDefinition {
    pub name: String,
    /// Extra local ordering edges beyond those implied by the spec.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub spec: DefinitionSpec,
}

/// Kind-specific configuration of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionSpec {
    Component(ComponentSpec),
    Resource(ResourceSpec),
    Channel(ChannelSpec),
    Wire(WireSpec),
    Binding(BindingSpec),
    /// A kind contributed by an extension; `config` is opaque to the core.
    Extension {
        extension_kind: String,
        #[serde(default)]
        config: serde_json::Value,
    },
}

/// A component instance to create through a registered factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Factory key of the implementation.
    pub implementation: String,
    /// Property values; strings of the form `${key}` are resolved against
    /// the configuration collaborator during generation.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Services the component offers to wires.
    #[serde(default)]
    pub services: Vec<String>,
    /// Reference slots the component expects wires to fill.
    #[serde(default)]
    pub references: Vec<String>,
    /// Local resource definitions handed to the factory.
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub producers: Vec<ChannelEndpoint>,
    #[serde(default)]
    pub consumers: Vec<ChannelEndpoint>,
    /// Push-style subscriptions delivered to the component's event hook.
    #[serde(default)]
    pub subscriptions: Vec<ChannelEndpoint>,
}

/// A named slot bound to a channel and optional topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEndpoint {
    pub name: String,
    pub channel: String,
    #[serde(default)]
    pub topic: Option<String>,
}

impl ChannelEndpoint {
    pub fn new(name: impl Into<String>, channel: impl Into<String>, topic: Option<&str>) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            topic: topic.map(str::to_string),
        }
    }
}

/// A shared resource, optionally aggregating ordered parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub provider: String,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
    /// Opened in declaration order, closed in reverse.
    #[serde(default)]
    pub parts: Vec<ResourcePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePart {
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

/// A named publish/subscribe endpoint. The definition name is the channel
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// When non-empty, the only topics producers and subscribers may use.
    #[serde(default)]
    pub topics: BTreeSet<String>,
    /// Descriptive payload type name.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Connects a component reference to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSpec {
    /// Local component owning the reference.
    pub source: String,
    pub reference: String,
    pub target: WireTarget,
}

/// Where a wire points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireTarget {
    /// A component in the same unit.
    Local { component: String },
    /// A symbol exported by another unit, reached through a federation wire.
    Imported { package: String, symbol: String },
}

/// Attaches a transport to a component endpoint. Transports are external
/// collaborators; the core only orders the binding after its component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub transport: String,
    pub component: String,
    /// Service or reference name on the component.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

/// An ordering edge implied by a definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Another definition of the same unit.
    Local(String),
    /// A symbol reached through an imported package.
    Imported { package: String, symbol: String },
    /// A process-wide channel name.
    Channel(String),
}

impl LogicalDefinition {
    pub fn new(name: impl Into<String>, spec: DefinitionSpec) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            spec,
        }
    }

    pub fn component(name: impl Into<String>, spec: ComponentSpec) -> Self {
        Self::new(name, DefinitionSpec::Component(spec))
    }

    pub fn resource(name: impl Into<String>, spec: ResourceSpec) -> Self {
        Self::new(name, DefinitionSpec::Resource(spec))
    }

    pub fn channel(name: impl Into<String>, spec: ChannelSpec) -> Self {
        Self::new(name, DefinitionSpec::Channel(spec))
    }

    pub fn wire(name: impl Into<String>, spec: WireSpec) -> Self {
        Self::new(name, DefinitionSpec::Wire(spec))
    }

    pub fn binding(name: impl Into<String>, spec: BindingSpec) -> Self {
        Self::new(name, DefinitionSpec::Binding(spec))
    }

    pub fn extension(
        name: impl Into<String>,
        kind: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self::new(
            name,
            DefinitionSpec::Extension {
                extension_kind: kind.into(),
                config,
            },
        )
    }

    /// Add an explicit local ordering edge.
    #[must_use]
    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Runtime kind used for generator dispatch.
    #[must_use]
    pub fn kind(&self) -> DefinitionKind {
        match &self.spec {
            DefinitionSpec::Component(_) => DefinitionKind::component(),
            DefinitionSpec::Resource(_) => DefinitionKind::resource(),
            DefinitionSpec::Channel(_) => DefinitionKind::channel(),
            DefinitionSpec::Wire(_) => DefinitionKind::wire(),
            DefinitionSpec::Binding(_) => DefinitionKind::binding(),
            DefinitionSpec::Extension { extension_kind, .. } => {
                DefinitionKind::new(extension_kind.clone())
            }
        }
    }

    /// Every edge this definition must be ordered after, without duplicates,
    /// in first-seen order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut edges: Vec<Dependency> = self
            .depends_on
            .iter()
            .cloned()
            .map(Dependency::Local)
            .collect();

        match &self.spec {
            DefinitionSpec::Component(component) => {
                edges.extend(component.resources.iter().cloned().map(Dependency::Local));
                let endpoints = component
                    .producers
                    .iter()
                    .chain(&component.consumers)
                    .chain(&component.subscriptions);
                edges.extend(endpoints.map(|e| Dependency::Channel(e.channel.clone())));
            }
            DefinitionSpec::Wire(wire) => {
                edges.push(Dependency::Local(wire.source.clone()));
                edges.push(match &wire.target {
                    WireTarget::Local { component } => Dependency::Local(component.clone()),
                    WireTarget::Imported { package, symbol } => Dependency::Imported {
                        package: package.clone(),
                        symbol: symbol.clone(),
                    },
                });
            }
            DefinitionSpec::Binding(binding) => {
                edges.push(Dependency::Local(binding.component.clone()));
            }
            DefinitionSpec::Resource(_)
            | DefinitionSpec::Channel(_)
            | DefinitionSpec::Extension { .. } => {}
        }

        let mut seen = HashSet::new();
        edges.retain(|edge| seen.insert(edge.clone()));
        edges
    }
}
