//! Deployment Orchestrator
//!
//! Drives one deployment transaction over a set of units:
//!
//! ```text
//! reserve → resolve → order → generate → preflight → attach wires → build → commit
//!                                                                     │
//!                                         failure: remove built ones in reverse,
//!                                         detach wires, surface the build error
//! ```
//!
//! Nothing before the build step touches the running system, so resolution,
//! ordering and generation failures leave no trace. No lock is held while a
//! generator or builder runs.

use crate::adapters::TracingMonitor;
use crate::domain::{order_definitions, DefinitionRef, Deployment, DeploymentId, DeploymentSummary};
use crate::error::{DeploymentError, DeploymentResult};
use crate::ports::{DeploymentMonitor, MonitorEvent, Outcome};
use lm_01_federation::{FederationError, FederationWire, Namespace, Resolution};
use lm_02_generation::{GenerationContext, GeneratorRegistry};
use lm_03_building::{BuildContext, BuildError, BuilderRegistry};
use loom_telemetry::{time_histogram, DEPLOYMENT_DURATION};
use parking_lot::{Mutex, RwLock};
use shared_types::{ConfigurationProvider, LogicalUnit, PhysicalDefinition, UnitUri};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, instrument, warn};

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Refuse to undeploy a unit while units of other deployments still
    /// import from it.
    pub refuse_in_use: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            refuse_in_use: true,
        }
    }
}

/// Unit URIs claimed by an in-flight transaction. Released on drop.
struct Reservation<'a> {
    pending: &'a Mutex<HashSet<UnitUri>>,
    uris: Vec<UnitUri>,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        for uri in &self.uris {
            pending.remove(uri);
        }
    }
}

/// Deploys and undeploys unit sets.
pub struct DeploymentOrchestrator {
    generators: Arc<GeneratorRegistry>,
    builders: Arc<BuilderRegistry>,
    services: BuildContext,
    configuration: Arc<dyn ConfigurationProvider>,
    monitor: Arc<dyn DeploymentMonitor>,
    config: OrchestratorConfig,
    deployments: RwLock<Vec<Deployment>>,
    pending: Mutex<HashSet<UnitUri>>,
}

impl DeploymentOrchestrator {
    /// Create an orchestrator over the given registries and shared services.
    /// Events go to a [`TracingMonitor`] until another monitor is set.
    pub fn new(
        generators: Arc<GeneratorRegistry>,
        builders: Arc<BuilderRegistry>,
        services: BuildContext,
        configuration: Arc<dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            generators,
            builders,
            services,
            configuration,
            monitor: Arc::new(TracingMonitor),
            config: OrchestratorConfig::default(),
            deployments: RwLock::new(Vec::new()),
            pending: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<dyn DeploymentMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared runtime services every deployment builds into.
    #[must_use]
    pub fn services(&self) -> &BuildContext {
        &self.services
    }

    #[must_use]
    pub fn generators(&self) -> &Arc<GeneratorRegistry> {
        &self.generators
    }

    #[must_use]
    pub fn builders(&self) -> &Arc<BuilderRegistry> {
        &self.builders
    }

    /// Deploy `units` as one transaction.
    ///
    /// # Errors
    ///
    /// - `AlreadyDeployed` if a unit is installed or claimed by another
    ///   in-flight transaction
    /// - `DuplicateDefinition`, `UnknownDependency`, `CyclicDependency` for a
    ///   malformed definition graph
    /// - `Federation` and `Generation` before anything is built
    /// - `Build` after everything built so far was removed again
    #[instrument(skip(self, units), fields(units = units.len()))]
    pub async fn deploy(&self, units: Vec<LogicalUnit>) -> DeploymentResult<DeploymentId> {
        let _timer = time_histogram!(DEPLOYMENT_DURATION);
        let id = DeploymentId::new();
        let _reservation = self.reserve(&units)?;
        check_unique_names(&units)?;

        let resolution = self.services.federation.resolve(&units)?;
        let order = order_definitions(&units, &resolution)?;
        debug!(deployment = %id, definitions = order.len(), "Definitions ordered");

        let definitions = self.generate(&units, &resolution, &order)?;
        self.preflight(&definitions)?;

        let ctx = self.services.for_deployment(id.to_string());
        let wires = self.attach_wires(&resolution);

        let mut built: Vec<&PhysicalDefinition> = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            match self.builders.build(definition, &ctx).await {
                Ok(_) => {
                    self.monitor
                        .record(&MonitorEvent::for_physical(definition, Outcome::Built));
                    built.push(definition);
                }
                Err(err) => {
                    self.monitor.record(
                        &MonitorEvent::for_physical(definition, Outcome::BuildFailed)
                            .with_error(&err),
                    );
                    let failures = self.remove_in_reverse(&built, &ctx).await;
                    self.detach_wires(&wires);
                    self.services.channels.close_owned_by(&ctx.deployment);
                    self.monitor
                        .rolled_back(&id, built.len() - failures.len());
                    return Err(err.into());
                }
            }
        }

        let uris: Vec<UnitUri> = units.iter().map(|u| u.uri.clone()).collect();
        for unit in units {
            self.services.federation.install(Arc::new(unit));
        }

        let deployment = Deployment {
            id,
            units: uris,
            definitions,
            wires,
            deployed_at: SystemTime::now(),
        };
        self.monitor
            .committed(&id, deployment.units.len(), deployment.definitions.len());
        info!(
            deployment = %id,
            units = ?deployment.units,
            artifacts = deployment.definitions.len(),
            "Deployment committed"
        );
        self.deployments.write().push(deployment);
        Ok(id)
    }

    /// Tear a deployment down: remove every artifact in reverse build order,
    /// detach its wires, uninstall its units and close the channels it owns.
    ///
    /// Every artifact is removed even if some removals fail; the failures
    /// are reported together afterwards.
    #[instrument(skip(self), fields(deployment = %id))]
    pub async fn undeploy(&self, id: DeploymentId) -> DeploymentResult<()> {
        let deployment = self.take(id)?;
        let ctx = self.services.for_deployment(id.to_string());

        let definitions: Vec<&PhysicalDefinition> = deployment.definitions.iter().collect();
        let failures = self.remove_in_reverse(&definitions, &ctx).await;

        let graph = &self.services.federation;
        for wire in graph.wires() {
            if deployment.units.contains(&wire.importer) || deployment.units.contains(&wire.exporter) {
                graph.detach(&wire);
            }
        }
        for uri in &deployment.units {
            graph.uninstall(uri);
        }

        let closed = self.services.channels.close_owned_by(&ctx.deployment);
        if !closed.is_empty() {
            debug!(deployment = %id, channels = ?closed, "Owned channels closed");
        }
        self.monitor.undeployed(&id, failures.len());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeploymentError::RemovalFailed {
                deployment: id,
                failures,
            })
        }
    }

    /// Undeploy everything, most recent deployment first. Returns the
    /// errors of the deployments that did not come down cleanly.
    pub async fn undeploy_all(&self) -> Vec<DeploymentError> {
        let ids: Vec<DeploymentId> = self.deployments.read().iter().rev().map(|d| d.id).collect();
        let mut errors = Vec::new();
        for id in ids {
            if let Err(err) = self.undeploy(id).await {
                warn!(deployment = %id, error = %err, "Undeploy failed");
                errors.push(err);
            }
        }
        errors
    }

    /// Committed deployments, oldest first.
    #[must_use]
    pub fn deployments(&self) -> Vec<DeploymentSummary> {
        self.deployments.read().iter().map(Deployment::summary).collect()
    }

    #[must_use]
    pub fn deployment(&self, id: DeploymentId) -> Option<DeploymentSummary> {
        self.deployments
            .read()
            .iter()
            .find(|d| d.id == id)
            .map(Deployment::summary)
    }

    /// Physical definitions of a deployment in build order.
    #[must_use]
    pub fn physical_definitions(&self, id: DeploymentId) -> Option<Vec<PhysicalDefinition>> {
        self.deployments
            .read()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.definitions.clone())
    }

    fn reserve(&self, units: &[LogicalUnit]) -> DeploymentResult<Reservation<'_>> {
        let mut pending = self.pending.lock();
        let mut seen = HashSet::new();
        for unit in units {
            if !seen.insert(&unit.uri) {
                return Err(FederationError::DuplicateUnit {
                    unit: unit.uri.clone(),
                }
                .into());
            }
            if pending.contains(&unit.uri) || self.services.federation.contains(&unit.uri) {
                return Err(DeploymentError::AlreadyDeployed {
                    unit: unit.uri.clone(),
                });
            }
        }

        let uris: Vec<UnitUri> = units.iter().map(|u| u.uri.clone()).collect();
        pending.extend(uris.iter().cloned());
        Ok(Reservation {
            pending: &self.pending,
            uris,
        })
    }

    fn generate(
        &self,
        units: &[LogicalUnit],
        resolution: &Resolution,
        order: &[DefinitionRef],
    ) -> DeploymentResult<Vec<PhysicalDefinition>> {
        let mut generated = Vec::with_capacity(order.len());
        for &(u, d) in order {
            let unit = &units[u];
            let definition = &unit.definitions[d];

            let fallback;
            let namespace = match resolution.namespace(&unit.uri) {
                Some(namespace) => namespace,
                None => {
                    let local = unit.definitions.iter().map(|d| d.name.clone()).collect();
                    fallback = Namespace::new(unit.uri.clone(), local);
                    &fallback
                }
            };

            let ctx = GenerationContext::new(unit, namespace, self.configuration.as_ref());
            match self.generators.generate(definition, &ctx) {
                Ok(physical) => {
                    self.monitor
                        .record(&MonitorEvent::for_physical(&physical, Outcome::Generated));
                    generated.push(physical);
                }
                Err(err) => {
                    self.monitor.record(
                        &MonitorEvent::new(
                            unit.uri.clone(),
                            definition.kind(),
                            definition.name.clone(),
                            Outcome::GenerationFailed,
                        )
                        .with_error(&err),
                    );
                    return Err(err.into());
                }
            }
        }
        Ok(generated)
    }

    /// Fail before any side effect if some generated kind has no builder.
    fn preflight(&self, definitions: &[PhysicalDefinition]) -> DeploymentResult<()> {
        for definition in definitions {
            if !self.builders.contains(&definition.kind) {
                let err = BuildError::NoBuilder {
                    id: definition.id.clone(),
                    kind: definition.kind.clone(),
                };
                self.monitor.record(
                    &MonitorEvent::for_physical(definition, Outcome::BuildFailed).with_error(&err),
                );
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn attach_wires(&self, resolution: &Resolution) -> Vec<FederationWire> {
        resolution
            .wires
            .iter()
            .filter(|wire| self.services.federation.attach((*wire).clone()))
            .cloned()
            .collect()
    }

    fn detach_wires(&self, wires: &[FederationWire]) {
        for wire in wires {
            self.services.federation.detach(wire);
        }
    }

    /// Remove `definitions` last to first, continuing past failures.
    async fn remove_in_reverse(
        &self,
        definitions: &[&PhysicalDefinition],
        ctx: &BuildContext,
    ) -> Vec<BuildError> {
        let mut failures = Vec::new();
        for definition in definitions.iter().rev() {
            match self.builders.remove(definition, ctx).await {
                Ok(()) => self
                    .monitor
                    .record(&MonitorEvent::for_physical(definition, Outcome::Removed)),
                Err(err) => {
                    self.monitor.record(
                        &MonitorEvent::for_physical(definition, Outcome::RemoveFailed)
                            .with_error(&err),
                    );
                    failures.push(err);
                }
            }
        }
        failures
    }

    /// Take a deployment out of the committed list, unless its units are
    /// still imported from outside it.
    fn take(&self, id: DeploymentId) -> DeploymentResult<Deployment> {
        let mut deployments = self.deployments.write();
        let position = deployments
            .iter()
            .position(|d| d.id == id)
            .ok_or(DeploymentError::UnknownDeployment(id))?;

        if self.config.refuse_in_use {
            let own = &deployments[position].units;
            for unit in own {
                let importers: Vec<UnitUri> = self
                    .services
                    .federation
                    .importers_of(unit)
                    .into_iter()
                    .filter(|importer| !own.contains(importer))
                    .collect();
                if !importers.is_empty() {
                    return Err(DeploymentError::UnitInUse {
                        unit: unit.clone(),
                        importers,
                    });
                }
            }
        }
        Ok(deployments.remove(position))
    }
}

fn check_unique_names(units: &[LogicalUnit]) -> DeploymentResult<()> {
    for unit in units {
        let mut names = HashSet::new();
        for definition in &unit.definitions {
            if !names.insert(definition.name.as_str()) {
                return Err(DeploymentError::DuplicateDefinition {
                    unit: unit.uri.clone(),
                    name: definition.name.clone(),
                });
            }
        }
    }
    Ok(())
}

impl std::fmt::Debug for DeploymentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentOrchestrator")
            .field("deployments", &self.deployments.read().len())
            .field("config", &self.config)
            .finish()
    }
}
