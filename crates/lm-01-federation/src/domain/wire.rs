//! Federation wires and per-unit namespaces

use serde::{Deserialize, Serialize};
use shared_types::{PhysicalId, UnitUri};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A directed import edge: `importer` sees `package` as exported by
/// `exporter`.
///
/// Invariant: `exporter` exports `package`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FederationWire {
    pub importer: UnitUri,
    pub exporter: UnitUri,
    pub package: String,
}

impl FederationWire {
    pub fn new(importer: UnitUri, exporter: UnitUri, package: impl Into<String>) -> Self {
        Self {
            importer,
            exporter,
            package: package.into(),
        }
    }
}

impl fmt::Display for FederationWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.importer, self.package, self.exporter)
    }
}

/// A package as seen from an importing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPackage {
    pub exporter: UnitUri,
    pub symbols: BTreeSet<String>,
}

/// Symbol table of one unit: its own definitions plus the packages its
/// wires make visible. Nothing outside this table can be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    unit: UnitUri,
    local: BTreeSet<String>,
    imports: BTreeMap<String, ImportedPackage>,
}

impl Namespace {
    pub fn new(unit: UnitUri, local: BTreeSet<String>) -> Self {
        Self {
            unit,
            local,
            imports: BTreeMap::new(),
        }
    }

    pub(crate) fn import(&mut self, package: &str, exporter: UnitUri, symbols: BTreeSet<String>) {
        self.imports
            .insert(package.to_string(), ImportedPackage { exporter, symbols });
    }

    #[must_use]
    pub fn unit(&self) -> &UnitUri {
        &self.unit
    }

    /// Resolve a definition name declared by this unit.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<PhysicalId> {
        self.local
            .contains(name)
            .then(|| PhysicalId::new(self.unit.clone(), name))
    }

    /// Resolve `symbol` of an imported package to the exporter's definition.
    #[must_use]
    pub fn imported(&self, package: &str, symbol: &str) -> Option<PhysicalId> {
        let imported = self.imports.get(package)?;
        imported
            .symbols
            .contains(symbol)
            .then(|| PhysicalId::new(imported.exporter.clone(), symbol))
    }

    /// Unit that provides `package` to this namespace.
    #[must_use]
    pub fn exporter_of(&self, package: &str) -> Option<&UnitUri> {
        self.imports.get(package).map(|p| &p.exporter)
    }

    pub fn imports(&self) -> impl Iterator<Item = (&str, &ImportedPackage)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_lookup() {
        let mut ns = Namespace::new("app".into(), ["checkout".to_string()].into());
        ns.import("pricing", "lib".into(), ["Calculator".to_string()].into());

        assert_eq!(ns.local("checkout"), Some(PhysicalId::new("app".into(), "checkout")));
        assert_eq!(ns.local("Calculator"), None);
        assert_eq!(
            ns.imported("pricing", "Calculator"),
            Some(PhysicalId::new("lib".into(), "Calculator"))
        );
        assert_eq!(ns.imported("pricing", "Internal"), None);
        assert_eq!(ns.imported("billing", "Calculator"), None);
    }
}
