//! Import resolution
//!
//! A pure function from (installed units, committed wires, proposed units) to
//! the wire set and namespaces the proposed units need. Nothing here mutates
//! the federation graph; wires are attached when the deployment builds them.

use super::wire::{FederationWire, Namespace};
use crate::error::{FederationError, FederationResult};
use shared_types::{ImportDeclaration, LogicalUnit, UnitUri};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Outcome of resolving a proposed unit set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// New wires, in proposed-unit then import-declaration order.
    pub wires: Vec<FederationWire>,
    /// Symbol table of every proposed unit.
    pub namespaces: BTreeMap<UnitUri, Namespace>,
}

impl Resolution {
    #[must_use]
    pub fn namespace(&self, unit: &UnitUri) -> Option<&Namespace> {
        self.namespaces.get(unit)
    }
}

/// Compute the federation wires needed to satisfy every import of
/// `proposed`.
///
/// For each import the exporter with the highest version inside the range is
/// chosen; equal versions go to the lowest unit URI. A unit that exports a
/// package itself satisfies its own import of it without a wire.
///
/// # Errors
///
/// - `DuplicateUnit` if a proposed URI is installed or proposed twice
/// - `UnresolvedImport` naming the first import nothing satisfies
/// - `CyclicDependency` with the full unit path if the new wires close a loop
pub fn resolve(
    installed: &[&LogicalUnit],
    existing: &[FederationWire],
    proposed: &[LogicalUnit],
) -> FederationResult<Resolution> {
    let mut seen: HashSet<&UnitUri> = installed.iter().map(|u| &u.uri).collect();
    for unit in proposed {
        if !seen.insert(&unit.uri) {
            return Err(FederationError::DuplicateUnit {
                unit: unit.uri.clone(),
            });
        }
    }

    let candidates: Vec<&LogicalUnit> = installed
        .iter()
        .copied()
        .chain(proposed.iter())
        .collect();

    let mut resolution = Resolution::default();
    for unit in proposed {
        let local = unit.definitions.iter().map(|d| d.name.clone()).collect();
        let mut namespace = Namespace::new(unit.uri.clone(), local);

        for import in &unit.imports {
            let exporter = select_exporter(unit, import, &candidates)?;
            let symbols = exporter
                .exported_symbols(&import.package)
                .cloned()
                .unwrap_or_default();
            namespace.import(&import.package, exporter.uri.clone(), symbols);

            if exporter.uri != unit.uri {
                let wire = FederationWire::new(
                    unit.uri.clone(),
                    exporter.uri.clone(),
                    import.package.clone(),
                );
                debug!(wire = %wire, version = %exporter.version, "Import resolved");
                resolution.wires.push(wire);
            }
        }
        resolution.namespaces.insert(unit.uri.clone(), namespace);
    }

    let all_wires: Vec<&FederationWire> = existing.iter().chain(&resolution.wires).collect();
    if let Some(path) = find_cycle(&all_wires) {
        return Err(FederationError::CyclicDependency { path });
    }

    Ok(resolution)
}

fn select_exporter<'a>(
    importer: &'a LogicalUnit,
    import: &ImportDeclaration,
    candidates: &[&'a LogicalUnit],
) -> FederationResult<&'a LogicalUnit> {
    if importer.exports_package(&import.package) {
        return Ok(importer);
    }

    candidates
        .iter()
        .copied()
        .filter(|c| c.exports_package(&import.package) && import.range.contains(&c.version))
        .max_by(|a, b| a.version.cmp(&b.version).then_with(|| b.uri.cmp(&a.uri)))
        .ok_or_else(|| FederationError::UnresolvedImport {
            unit: importer.uri.clone(),
            package: import.package.clone(),
            range: import.range.to_string(),
        })
}

/// Depth-first search over importer -> exporter edges. Returns the first
/// cycle found as a path that starts and ends at the same unit.
fn find_cycle(wires: &[&FederationWire]) -> Option<Vec<UnitUri>> {
    let mut edges: BTreeMap<&UnitUri, BTreeSet<&UnitUri>> = BTreeMap::new();
    for wire in wires {
        edges.entry(&wire.importer).or_default().insert(&wire.exporter);
    }

    let mut done: HashSet<&UnitUri> = HashSet::new();
    let mut stack: Vec<&UnitUri> = Vec::new();
    for start in edges.keys().copied() {
        if let Some(path) = visit(start, &edges, &mut stack, &mut done) {
            return Some(path);
        }
    }
    None
}

fn visit<'a>(
    unit: &'a UnitUri,
    edges: &BTreeMap<&'a UnitUri, BTreeSet<&'a UnitUri>>,
    stack: &mut Vec<&'a UnitUri>,
    done: &mut HashSet<&'a UnitUri>,
) -> Option<Vec<UnitUri>> {
    if done.contains(unit) {
        return None;
    }
    if let Some(position) = stack.iter().position(|u| *u == unit) {
        let mut path: Vec<UnitUri> = stack[position..].iter().map(|u| (*u).clone()).collect();
        path.push(unit.clone());
        return Some(path);
    }

    stack.push(unit);
    if let Some(next) = edges.get(unit) {
        for exporter in next.iter().copied() {
            if let Some(path) = visit(exporter, edges, stack, done) {
                return Some(path);
            }
        }
    }
    stack.pop();
    done.insert(unit);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Version, VersionRange};

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn range(s: &str) -> VersionRange {
        s.parse().unwrap()
    }

    fn exporter(uri: &str, version: &str, package: &str) -> LogicalUnit {
        LogicalUnit::new(uri, v(version)).exporting(package, ["Service"])
    }

    #[test]
    fn test_single_import_resolves() {
        let a = exporter("unit:a", "1.5", "p");
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("p", range("[1.0,2.0)"));

        let resolution = resolve(&[&a], &[], &[b]).unwrap();

        assert_eq!(
            resolution.wires,
            vec![FederationWire::new("unit:b".into(), "unit:a".into(), "p")]
        );
        let ns = resolution.namespace(&"unit:b".into()).unwrap();
        assert_eq!(ns.exporter_of("p"), Some(&UnitUri::from("unit:a")));
    }

    #[test]
    fn test_unresolved_import_names_unit_and_package() {
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("q", VersionRange::any());

        let err = resolve(&[], &[], &[b]).unwrap_err();

        assert!(matches!(
            err,
            FederationError::UnresolvedImport { ref unit, ref package, .. }
                if unit.as_str() == "unit:b" && package == "q"
        ));
    }

    #[test]
    fn test_out_of_range_exporter_is_unresolved() {
        let a = exporter("unit:a", "2.0", "p");
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("p", range("[1.0,2.0)"));

        assert!(matches!(
            resolve(&[&a], &[], &[b]),
            Err(FederationError::UnresolvedImport { .. })
        ));
    }

    #[test]
    fn test_highest_version_wins() {
        let old = exporter("unit:a", "1.2", "p");
        let new = exporter("unit:z", "1.9", "p");
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("p", range("[1.0,2.0)"));

        let resolution = resolve(&[&old, &new], &[], &[b]).unwrap();
        assert_eq!(resolution.wires[0].exporter.as_str(), "unit:z");
    }

    #[test]
    fn test_equal_versions_lowest_uri_wins() {
        let high = exporter("unit:m", "1.5", "p");
        let low = exporter("unit:c", "1.5", "p");
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("p", range("[1.0,2.0)"));

        let resolution = resolve(&[&high, &low], &[], &[b]).unwrap();
        assert_eq!(resolution.wires[0].exporter.as_str(), "unit:c");
    }

    #[test]
    fn test_self_export_needs_no_wire() {
        let a = LogicalUnit::new("unit:a", v("1.0"))
            .exporting("p", ["Service"])
            .importing("p", VersionRange::any());

        let resolution = resolve(&[], &[], &[a]).unwrap();
        assert!(resolution.wires.is_empty());
        assert_eq!(
            resolution
                .namespace(&"unit:a".into())
                .unwrap()
                .imported("p", "Service")
                .unwrap()
                .unit
                .as_str(),
            "unit:a"
        );
    }

    #[test]
    fn test_proposed_units_resolve_each_other() {
        let a = exporter("unit:a", "1.0", "p");
        let b = LogicalUnit::new("unit:b", v("1.0")).importing("p", VersionRange::any());

        let resolution = resolve(&[], &[], &[b, a]).unwrap();
        assert_eq!(resolution.wires.len(), 1);
        assert_eq!(resolution.namespaces.len(), 2);
    }

    #[test]
    fn test_cycle_reports_full_path() {
        let a = LogicalUnit::new("unit:a", v("1.0"))
            .exporting("pa", ["A"])
            .importing("pc", VersionRange::any());
        let b = LogicalUnit::new("unit:b", v("1.0"))
            .exporting("pb", ["B"])
            .importing("pa", VersionRange::any());
        let c = LogicalUnit::new("unit:c", v("1.0"))
            .exporting("pc", ["C"])
            .importing("pb", VersionRange::any());

        let err = resolve(&[], &[], &[a, b, c]).unwrap_err();
        let FederationError::CyclicDependency { path } = err else {
            panic!("expected a cycle, got {err:?}");
        };
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 4);
        let units: BTreeSet<&str> = path.iter().map(UnitUri::as_str).collect();
        assert_eq!(units, ["unit:a", "unit:b", "unit:c"].into());
    }

    #[test]
    fn test_cycle_through_existing_wires() {
        let a = LogicalUnit::new("unit:a", v("1.0")).exporting("pa", ["A"]);
        let b = LogicalUnit::new("unit:b", v("1.0"))
            .exporting("pb", ["B"])
            .importing("pa", VersionRange::any());
        let existing = vec![FederationWire::new("unit:b".into(), "unit:a".into(), "pa")];

        // Extending the chain is fine; closing it is not.
        let c = LogicalUnit::new("unit:c", v("1.0")).importing("pb", VersionRange::any());
        assert!(resolve(&[&a, &b], &existing, &[c]).is_ok());

        let cycle = vec![
            FederationWire::new("unit:b".into(), "unit:a".into(), "pa"),
            FederationWire::new("unit:a".into(), "unit:b".into(), "pb"),
        ];
        let refs: Vec<&FederationWire> = cycle.iter().collect();
        assert!(find_cycle(&refs).is_some());
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let a = exporter("unit:a", "1.0", "p");
        let again = exporter("unit:a", "1.1", "p");
        assert_eq!(
            resolve(&[&a], &[], &[again]),
            Err(FederationError::DuplicateUnit {
                unit: "unit:a".into()
            })
        );
    }

    #[test]
    fn test_every_wire_targets_an_exporter() {
        let lib = LogicalUnit::new("unit:lib", v("1.0"))
            .exporting("p", ["P"])
            .exporting("q", ["Q"]);
        let mid = LogicalUnit::new("unit:mid", v("1.0"))
            .exporting("r", ["R"])
            .importing("p", VersionRange::any());
        let app = LogicalUnit::new("unit:app", v("1.0"))
            .importing("q", VersionRange::any())
            .importing("r", VersionRange::any());
        let units = [lib, mid, app];

        let resolution = resolve(&[], &[], &units).unwrap();
        assert_eq!(resolution.wires.len(), 3);
        for wire in &resolution.wires {
            let exporter = units.iter().find(|u| u.uri == wire.exporter).unwrap();
            assert!(exporter.exports_package(&wire.package));
        }
    }
}
