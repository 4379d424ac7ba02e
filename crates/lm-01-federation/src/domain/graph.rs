//! The committed federation graph
//!
//! Installed units and the wires currently attached between them. This and
//! the channel table are the only structures deployments mutate, so every
//! access goes through one reader/writer lock.

use super::resolver::{resolve, Resolution};
use super::wire::FederationWire;
use crate::error::FederationResult;
use parking_lot::RwLock;
use shared_types::{LogicalUnit, UnitUri};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct GraphState {
    units: BTreeMap<UnitUri, Arc<LogicalUnit>>,
    wires: Vec<FederationWire>,
}

/// Installed units plus attached federation wires.
#[derive(Default)]
pub struct FederationGraph {
    state: RwLock<GraphState>,
}

impl FederationGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `proposed` against a snapshot of the graph. The graph is not
    /// modified.
    pub fn resolve(&self, proposed: &[LogicalUnit]) -> FederationResult<Resolution> {
        let (units, wires) = {
            let state = self.state.read();
            let units: Vec<Arc<LogicalUnit>> = state.units.values().cloned().collect();
            (units, state.wires.clone())
        };
        let installed: Vec<&LogicalUnit> = units.iter().map(AsRef::as_ref).collect();
        resolve(&installed, &wires, proposed)
    }

    /// Attach a wire. Attaching the same wire twice keeps one copy.
    pub fn attach(&self, wire: FederationWire) -> bool {
        let mut state = self.state.write();
        if state.wires.contains(&wire) {
            return false;
        }
        debug!(wire = %wire, "Federation wire attached");
        state.wires.push(wire);
        true
    }

    /// Detach a wire. Returns `false` if it was not attached.
    pub fn detach(&self, wire: &FederationWire) -> bool {
        let mut state = self.state.write();
        let before = state.wires.len();
        state.wires.retain(|w| w != wire);
        let removed = before != state.wires.len();
        if removed {
            debug!(wire = %wire, "Federation wire detached");
        }
        removed
    }

    /// Record a unit as installed, making it a candidate exporter for later
    /// resolutions.
    pub fn install(&self, unit: Arc<LogicalUnit>) {
        info!(unit = %unit.uri, version = %unit.version, "Unit installed");
        self.state.write().units.insert(unit.uri.clone(), unit);
    }

    /// Forget a unit and every wire it imports through.
    pub fn uninstall(&self, uri: &UnitUri) -> Option<Arc<LogicalUnit>> {
        let mut state = self.state.write();
        let unit = state.units.remove(uri)?;
        state.wires.retain(|w| &w.importer != uri);
        info!(unit = %uri, "Unit uninstalled");
        Some(unit)
    }

    #[must_use]
    pub fn contains(&self, uri: &UnitUri) -> bool {
        self.state.read().units.contains_key(uri)
    }

    #[must_use]
    pub fn unit(&self, uri: &UnitUri) -> Option<Arc<LogicalUnit>> {
        self.state.read().units.get(uri).cloned()
    }

    /// Units with an attached wire importing from `uri`, sorted, without
    /// duplicates.
    #[must_use]
    pub fn importers_of(&self, uri: &UnitUri) -> Vec<UnitUri> {
        let mut importers: Vec<UnitUri> = self
            .state
            .read()
            .wires
            .iter()
            .filter(|w| &w.exporter == uri)
            .map(|w| w.importer.clone())
            .collect();
        importers.sort();
        importers.dedup();
        importers
    }

    #[must_use]
    pub fn wires(&self) -> Vec<FederationWire> {
        self.state.read().wires.clone()
    }

    #[must_use]
    pub fn unit_uris(&self) -> Vec<UnitUri> {
        self.state.read().units.keys().cloned().collect()
    }
}

impl std::fmt::Debug for FederationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("FederationGraph")
            .field("units", &state.units.keys().collect::<Vec<_>>())
            .field("wires", &state.wires)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FederationError;
    use shared_types::{Version, VersionRange};

    fn lib() -> LogicalUnit {
        LogicalUnit::new("unit:lib", Version::new(1, 0, 0)).exporting("pricing", ["Calculator"])
    }

    fn app() -> LogicalUnit {
        LogicalUnit::new("unit:app", Version::new(1, 0, 0)).importing("pricing", VersionRange::any())
    }

    #[test]
    fn test_attach_and_detach_once() {
        let graph = FederationGraph::new();
        graph.install(Arc::new(lib()));
        graph.install(Arc::new(app()));

        let wire = FederationWire::new("unit:app".into(), "unit:lib".into(), "pricing");
        assert!(graph.attach(wire.clone()));
        assert!(!graph.attach(wire.clone()));
        assert_eq!(graph.wires(), vec![wire.clone()]);

        assert!(graph.detach(&wire));
        assert!(!graph.detach(&wire));
        assert!(graph.wires().is_empty());
    }

    #[test]
    fn test_importers_of() {
        let graph = FederationGraph::new();
        graph.install(Arc::new(lib()));
        graph.install(Arc::new(app()));
        graph.attach(FederationWire::new("unit:app".into(), "unit:lib".into(), "pricing"));

        assert_eq!(graph.importers_of(&"unit:lib".into()), vec![UnitUri::from("unit:app")]);

        graph.uninstall(&"unit:app".into());
        assert!(graph.importers_of(&"unit:lib".into()).is_empty());
    }

    #[test]
    fn test_resolve_uses_installed_units_without_mutation() {
        let graph = FederationGraph::new();
        graph.install(Arc::new(lib()));

        let resolution = graph.resolve(&[app()]).unwrap();
        assert_eq!(resolution.wires.len(), 1);
        assert!(graph.wires().is_empty());
        assert!(!graph.contains(&"unit:app".into()));
    }

    #[test]
    fn test_resolve_rejects_installed_uri() {
        let graph = FederationGraph::new();
        graph.install(Arc::new(lib()));
        assert!(matches!(
            graph.resolve(&[lib()]),
            Err(FederationError::DuplicateUnit { .. })
        ));
    }
}
