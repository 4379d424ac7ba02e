//! Definition ordering
//!
//! Kahn's algorithm over the dependency edges of every definition in a
//! transaction. Among definitions that are ready at the same time the one
//! that comes first (unit order, then declaration order) is taken, so equal
//! input always yields the same build order.
//!
//! Edges:
//! - a local name must be declared by the same unit
//! - an imported symbol orders after its exporter's definition when that
//!   exporter is deployed in the same transaction
//! - a channel orders after its declaration when some unit of the
//!   transaction declares it

use crate::error::{DeploymentError, DeploymentResult};
use lm_01_federation::Resolution;
use shared_types::{Dependency, LogicalUnit, PhysicalId};
use std::collections::{BTreeSet, HashMap};

/// Position of a definition: `(unit index, definition index)`.
pub type DefinitionRef = (usize, usize);

/// Topologically order every definition of `units`.
///
/// # Errors
///
/// - `UnknownDependency` for a local edge to an undeclared name
/// - `CyclicDependency` with the full loop when no order exists
pub fn order_definitions(
    units: &[LogicalUnit],
    resolution: &Resolution,
) -> DeploymentResult<Vec<DefinitionRef>> {
    let refs: Vec<DefinitionRef> = units
        .iter()
        .enumerate()
        .flat_map(|(u, unit)| (0..unit.definitions.len()).map(move |d| (u, d)))
        .collect();
    let index: HashMap<PhysicalId, usize> = refs
        .iter()
        .enumerate()
        .map(|(i, &(u, d))| (id_of(units, (u, d)), i))
        .collect();

    let mut channels: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, &(u, d)) in refs.iter().enumerate() {
        let definition = &units[u].definitions[d];
        if matches!(definition.spec, shared_types::DefinitionSpec::Channel(_)) {
            channels.entry(definition.name.as_str()).or_default().push(i);
        }
    }

    let mut depends_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); refs.len()];
    for (i, &(u, d)) in refs.iter().enumerate() {
        let unit = &units[u];
        let definition = &unit.definitions[d];
        for dependency in definition.dependencies() {
            match dependency {
                Dependency::Local(name) => {
                    let target = PhysicalId::new(unit.uri.clone(), name.clone());
                    let Some(&j) = index.get(&target) else {
                        return Err(DeploymentError::UnknownDependency {
                            definition: id_of(units, (u, d)),
                            dependency: name,
                        });
                    };
                    depends_on[i].insert(j);
                }
                Dependency::Imported { package, symbol } => {
                    // Unresolvable symbols are reported by generation.
                    let target = resolution
                        .namespace(&unit.uri)
                        .and_then(|ns| ns.imported(&package, &symbol));
                    if let Some(j) = target.and_then(|id| index.get(&id)) {
                        depends_on[i].insert(*j);
                    }
                }
                Dependency::Channel(channel) => {
                    if let Some(declarations) = channels.get(channel.as_str()) {
                        depends_on[i].extend(declarations.iter().filter(|&&j| j != i));
                    }
                }
            }
        }
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); refs.len()];
    for (i, deps) in depends_on.iter().enumerate() {
        for &j in deps {
            dependents[j].push(i);
        }
    }

    let mut pending: Vec<usize> = depends_on.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<usize> = (0..refs.len()).filter(|&i| pending[i] == 0).collect();
    let mut ordered = Vec::with_capacity(refs.len());

    while let Some(i) = ready.pop_first() {
        ordered.push(refs[i]);
        for &k in &dependents[i] {
            pending[k] -= 1;
            if pending[k] == 0 {
                ready.insert(k);
            }
        }
    }

    if ordered.len() < refs.len() {
        let path = find_cycle(&depends_on, &pending)
            .into_iter()
            .map(|i| id_of(units, refs[i]))
            .collect();
        return Err(DeploymentError::CyclicDependency { path });
    }
    Ok(ordered)
}

fn id_of(units: &[LogicalUnit], (u, d): DefinitionRef) -> PhysicalId {
    PhysicalId::new(units[u].uri.clone(), units[u].definitions[d].name.clone())
}

/// Every node Kahn left behind still waits on another left-behind node, so
/// following those edges from any of them must revisit a node.
fn find_cycle(depends_on: &[BTreeSet<usize>], pending: &[usize]) -> Vec<usize> {
    let stuck = |i: usize| pending[i] > 0;
    let Some(start) = (0..pending.len()).find(|&i| stuck(i)) else {
        return Vec::new();
    };

    let mut path = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&at) = position.get(&current) {
            let mut cycle = path[at..].to_vec();
            cycle.push(current);
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);
        match depends_on[current].iter().copied().find(|&j| stuck(j)) {
            Some(next) => current = next,
            None => return path,
        }
    }
}
