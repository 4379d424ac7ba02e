use super::config::RuntimeConfig;
use crate::components::register_builtin;
use crate::transport::{EndpointDirectory, EndpointError, LocalBindingBuilder};
use anyhow::{Context, Result};
use lm_02_generation::{Generator, GeneratorRegistry};
use lm_03_building::{
    BuildContext, Builder, BuilderRegistry, ComponentError, ComponentFactory, ComponentInstance,
    ResourceProvider,
};
use lm_04_deployment::{
    DeploymentError, DeploymentId, DeploymentMonitor, DeploymentOrchestrator, DeploymentResult,
    DeploymentSummary, OrchestratorConfig, TracingMonitor,
};
use loom_telemetry::{CHANNELS_OPEN, CHANNEL_EVENTS_PUBLISHED};
use serde_json::Value;
use shared_types::{
    ConfigurationProvider, DefinitionKind, EnvConfiguration, LogicalUnit, PhysicalId,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of [`Runtime::invoke`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    #[error("No component {0} is deployed")]
    UnknownComponent(PhysicalId),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// The process-wide runtime.
pub struct Runtime {
    config: RuntimeConfig,
    orchestrator: DeploymentOrchestrator,
    endpoints: Arc<EndpointDirectory>,
}

impl Runtime {
    /// Runtime reading placeholders from `<config_prefix>_*` environment
    /// variables and reporting through tracing and metrics.
    pub fn new(config: RuntimeConfig) -> Self {
        let configuration = Arc::new(EnvConfiguration::new(config.config_prefix.clone()));
        Self::with_collaborators(config, configuration, Arc::new(TracingMonitor))
    }

    /// Runtime over explicit collaborators.
    ///
    /// ## Initialization Order
    ///
    /// 1. Shared services (channels, artifacts, federation graph, registries)
    /// 2. Default generators and builders, plus the `binding.local` builder
    /// 3. Built-in component implementations, when enabled
    /// 4. Orchestrator over all of the above
    pub fn with_collaborators(
        config: RuntimeConfig,
        configuration: Arc<dyn ConfigurationProvider>,
        monitor: Arc<dyn DeploymentMonitor>,
    ) -> Self {
        let services = BuildContext::new("runtime");
        let endpoints = Arc::new(EndpointDirectory::new());

        let generators = Arc::new(GeneratorRegistry::with_defaults());
        let builders = Arc::new(BuilderRegistry::with_defaults());
        builders.register(
            LocalBindingBuilder::kind(),
            Arc::new(LocalBindingBuilder::new(Arc::clone(&endpoints))),
        );

        if config.builtin_components {
            register_builtin(&services.components);
        }

        let orchestrator = DeploymentOrchestrator::new(generators, builders, services, configuration)
            .with_monitor(monitor)
            .with_config(OrchestratorConfig {
                refuse_in_use: config.refuse_in_use,
            });

        info!(
            builtin_components = config.builtin_components,
            refuse_in_use = config.refuse_in_use,
            config_prefix = %config.config_prefix,
            "Runtime initialized"
        );

        Self {
            config,
            orchestrator,
            endpoints,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn orchestrator(&self) -> &DeploymentOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn services(&self) -> &BuildContext {
        self.orchestrator.services()
    }

    /// Addresses published by `binding.local` definitions.
    #[must_use]
    pub fn endpoints(&self) -> &Arc<EndpointDirectory> {
        &self.endpoints
    }

    pub fn register_component(&self, implementation: &str, factory: Arc<dyn ComponentFactory>) {
        self.services().components.register(implementation, factory);
    }

    pub fn register_generator(&self, kind: DefinitionKind, generator: Arc<dyn Generator>) {
        self.orchestrator.generators().register(kind, generator);
    }

    pub fn register_builder(&self, kind: DefinitionKind, builder: Arc<dyn Builder>) {
        self.orchestrator.builders().register(kind, builder);
    }

    pub fn register_resource_provider(&self, name: &str, provider: Arc<dyn ResourceProvider>) {
        self.services().resources.register(name, provider);
    }

    /// Deploy `units` as one transaction.
    pub async fn deploy(&self, units: Vec<LogicalUnit>) -> DeploymentResult<DeploymentId> {
        let result = self.orchestrator.deploy(units).await;
        self.record_channel_metrics();
        result
    }

    pub async fn undeploy(&self, id: DeploymentId) -> DeploymentResult<()> {
        let result = self.orchestrator.undeploy(id).await;
        self.record_channel_metrics();
        result
    }

    #[must_use]
    pub fn deployments(&self) -> Vec<DeploymentSummary> {
        self.orchestrator.deployments()
    }

    /// Undeploy everything, newest deployment first. Returns every failure
    /// met on the way; an empty vector means a clean shutdown.
    pub async fn shutdown(&self) -> Vec<DeploymentError> {
        info!(deployments = self.deployments().len(), "Runtime shutting down");
        let failures = self.orchestrator.undeploy_all().await;
        self.record_channel_metrics();

        if failures.is_empty() {
            info!("Runtime shut down cleanly");
        } else {
            for failure in &failures {
                warn!(error = %failure, "Shutdown failure");
            }
        }
        failures
    }

    /// A deployed component instance.
    #[must_use]
    pub fn component(&self, id: &PhysicalId) -> Option<Arc<ComponentInstance>> {
        self.services().artifacts.component(id)
    }

    /// Invoke `operation` on a deployed component.
    pub fn invoke(&self, id: &PhysicalId, operation: &str, payload: Value) -> Result<Value, InvokeError> {
        let instance = self
            .component(id)
            .ok_or_else(|| InvokeError::UnknownComponent(id.clone()))?;
        Ok(instance.invoke(operation, payload)?)
    }

    /// Invoke `operation` on whatever is bound at a local address.
    pub fn invoke_endpoint(&self, address: &str, operation: &str, payload: Value) -> Result<Value, EndpointError> {
        self.endpoints.invoke(address, operation, payload)
    }

    fn record_channel_metrics(&self) {
        let channels = &self.services().channels;
        CHANNELS_OPEN.set(channels.channel_names().len() as f64);
        CHANNEL_EVENTS_PUBLISHED.set(channels.events_published() as f64);
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// Read unit descriptors. Directories contribute their `*.json` files in
/// file name order.
pub fn load_units<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<LogicalUnit>> {
    let mut units = Vec::new();
    for path in paths {
        for file in descriptor_files(path.as_ref())? {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading descriptor {}", file.display()))?;
            let unit = LogicalUnit::from_json(&text)
                .with_context(|| format!("parsing descriptor {}", file.display()))?;
            debug!(unit = %unit.uri, file = %file.display(), "Descriptor loaded");
            units.push(unit);
        }
    }
    Ok(units)
}

fn descriptor_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("listing {}", path.display()))? {
        let file = entry?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "json") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_04_deployment::{Outcome, RecordingMonitor};
    use serde_json::json;
    use shared_types::{ComponentSpec, LogicalDefinition, MapConfiguration, Version};

    fn runtime() -> (Runtime, Arc<RecordingMonitor>) {
        let monitor = Arc::new(RecordingMonitor::default());
        let runtime = Runtime::with_collaborators(
            RuntimeConfig::default(),
            Arc::new(MapConfiguration::new().with("greeting", "hello")),
            monitor.clone(),
        );
        (runtime, monitor)
    }

    fn echo_unit() -> LogicalUnit {
        LogicalUnit::new("urn:echo", Version::new(1, 0, 0)).with_definition(
            LogicalDefinition::component(
                "Echo",
                ComponentSpec {
                    implementation: "loom.echo".into(),
                    properties: [("tag".to_string(), json!("${greeting}"))].into(),
                    ..Default::default()
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_deploy_invoke_shutdown() {
        let (runtime, monitor) = runtime();
        runtime.deploy(vec![echo_unit()]).await.unwrap();

        let id = PhysicalId::new("urn:echo".into(), "Echo");
        assert_eq!(
            runtime.invoke(&id, "echo", json!(1)).unwrap(),
            json!({ "tag": "hello", "payload": 1 })
        );
        assert_eq!(monitor.with_outcome(Outcome::Built), ["Echo"]);

        assert!(runtime.shutdown().await.is_empty());
        assert!(runtime.deployments().is_empty());
        assert_eq!(
            runtime.invoke(&id, "echo", json!(1)),
            Err(InvokeError::UnknownComponent(id))
        );
    }

    #[tokio::test]
    async fn test_builtin_components_can_be_disabled() {
        let runtime = Runtime::with_collaborators(
            RuntimeConfig {
                builtin_components: false,
                ..RuntimeConfig::default()
            },
            Arc::new(MapConfiguration::new().with("greeting", "hi")),
            Arc::new(TracingMonitor),
        );
        assert!(runtime.services().components.implementations().is_empty());
        assert!(runtime.deploy(vec![echo_unit()]).await.is_err());
        assert!(runtime.deployments().is_empty());
    }

    #[test]
    fn test_local_binding_builder_registered() {
        let (runtime, _) = runtime();
        assert!(runtime
            .orchestrator()
            .builders()
            .contains(&DefinitionKind::new("binding.local")));
    }
}
