//! # Runtime Integration Tests
//!
//! Drive the runtime container end to end: descriptors from disk, channel
//! delivery between built-in components, federation wires across units,
//! local bindings and extension kinds.

use async_trait::async_trait;
use lm_02_generation::PassthroughGenerator;
use lm_03_building::{Artifact, ArtifactHandle, BuildContext, Builder, BuilderFault};
use lm_04_deployment::{DeploymentError, TracingMonitor};
use loom_runtime::{load_units, Runtime, RuntimeConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::ChannelState;
use shared_types::{
    DefinitionKind, LogicalDefinition, LogicalUnit, MapConfiguration, PhysicalDefinition,
    PhysicalId, PhysicalSpec, UnitUri, Version,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

fn units_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("units")
}

fn runtime_with(configuration: MapConfiguration) -> Runtime {
    Runtime::with_collaborators(
        RuntimeConfig::default(),
        Arc::new(configuration),
        Arc::new(TracingMonitor),
    )
}

fn id(unit: &str, name: &str) -> PhysicalId {
    PhysicalId::new(UnitUri::new(unit), name)
}

fn unit_named(units: &[LogicalUnit], uri: &str) -> LogicalUnit {
    units
        .iter()
        .find(|u| u.uri.as_str() == uri)
        .cloned()
        .expect("descriptor present")
}

#[tokio::test]
async fn test_events_arrive_in_publish_order() {
    let runtime = runtime_with(MapConfiguration::new());
    let units = load_units(&[units_dir().join("orders.json")]).unwrap();
    runtime.deploy(units).await.unwrap();

    for order in 1..=2 {
        runtime
            .invoke_endpoint("local://orders/intake", "publish", json!({ "id": order }))
            .unwrap();
    }

    let events = runtime
        .invoke(&id("urn:loom:orders", "OrderLog"), "events", Value::Null)
        .unwrap();
    assert_eq!(events, json!([{ "id": 1 }, { "id": 2 }]));
    assert_eq!(runtime.services().channels.events_published(), 2);
}

#[tokio::test]
async fn test_federated_call_through_default_endpoint() {
    let runtime = runtime_with(MapConfiguration::new());
    let units = load_units(&[units_dir()]).unwrap();
    assert_eq!(units.len(), 3);

    let deployment = runtime.deploy(units).await.unwrap();
    let summary = runtime.orchestrator().deployment(deployment).unwrap();
    assert_eq!(summary.units.len(), 3);
    assert_eq!(summary.wires, 1);

    let reply = runtime
        .invoke_endpoint(
            "local://urn:loom:storefront/Storefront/shop",
            "echo",
            json!("basket"),
        )
        .unwrap();
    assert_eq!(reply, json!({ "tag": "EUR", "payload": "basket" }));
}

#[tokio::test]
async fn test_placeholder_values_come_from_configuration() {
    let runtime = runtime_with(MapConfiguration::new().with("pricing.currency", "CHF"));
    let units = load_units(&[units_dir().join("pricing.json")]).unwrap();
    runtime.deploy(units).await.unwrap();

    let reply = runtime
        .invoke(&id("urn:loom:pricing", "PriceService"), "echo", json!(3))
        .unwrap();
    assert_eq!(reply, json!({ "tag": "CHF", "payload": 3 }));
}

#[tokio::test]
async fn test_undeploy_releases_everything() {
    let runtime = runtime_with(MapConfiguration::new());
    let units = load_units(&[units_dir()]).unwrap();
    let deployment = runtime.deploy(units).await.unwrap();
    assert_eq!(runtime.services().channels.state("orders"), ChannelState::Active);

    runtime.undeploy(deployment).await.unwrap();

    assert!(runtime.deployments().is_empty());
    assert!(runtime.services().artifacts.is_empty());
    assert!(runtime.endpoints().addresses().is_empty());
    assert!(runtime.services().federation.unit_uris().is_empty());
    assert_eq!(runtime.services().channels.state("orders"), ChannelState::Uncreated);
}

#[tokio::test]
async fn test_undeclared_channel_closes_on_undeploy() {
    let runtime = runtime_with(MapConfiguration::new());
    let mut unit = unit_named(&load_units(&[units_dir()]).unwrap(), "urn:loom:orders");
    unit.definitions.retain(|d| d.name != "orders");

    let deployment = runtime.deploy(vec![unit]).await.unwrap();
    let channel = runtime.services().channels.get("orders").unwrap();
    assert_eq!(channel.state(), ChannelState::Active);
    assert!(!channel.is_declared());

    runtime.undeploy(deployment).await.unwrap();
    assert_eq!(runtime.services().channels.state("orders"), ChannelState::Uncreated);
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_exporter_stays_while_imported() {
    let runtime = runtime_with(MapConfiguration::new());
    let units = load_units(&[units_dir()]).unwrap();
    let pricing = runtime
        .deploy(vec![unit_named(&units, "urn:loom:pricing")])
        .await
        .unwrap();
    let storefront = runtime
        .deploy(vec![unit_named(&units, "urn:loom:storefront")])
        .await
        .unwrap();

    let err = runtime.undeploy(pricing).await.unwrap_err();
    assert!(matches!(err, DeploymentError::UnitInUse { .. }));
    assert_eq!(runtime.deployments().len(), 2);

    runtime.undeploy(storefront).await.unwrap();
    runtime.undeploy(pricing).await.unwrap();
    assert!(runtime.deployments().is_empty());
}

#[tokio::test]
async fn test_failed_deploy_leaves_running_deployments_alone() {
    let runtime = runtime_with(MapConfiguration::new());
    let units = load_units(&[units_dir()]).unwrap();
    runtime
        .deploy(vec![unit_named(&units, "urn:loom:orders")])
        .await
        .unwrap();

    // Same address as the orders intake: the binding fails and the
    // component built before it is removed again.
    let clash: LogicalUnit = serde_json::from_value(json!({
        "uri": "urn:loom:clash",
        "version": "1.0.0",
        "definitions": [
            { "name": "Echo", "kind": "component", "implementation": "loom.echo", "services": ["api"] },
            {
                "name": "echo-local",
                "kind": "binding",
                "transport": "local",
                "component": "Echo",
                "endpoint": "api",
                "config": { "address": "local://orders/intake" }
            }
        ]
    }))
    .unwrap();

    let err = runtime.deploy(vec![clash]).await.unwrap_err();
    assert!(matches!(err, DeploymentError::Build(_)));
    assert!(runtime.component(&id("urn:loom:clash", "Echo")).is_none());
    assert_eq!(runtime.deployments().len(), 1);
    assert!(runtime
        .invoke_endpoint("local://orders/intake", "publish", json!({ "id": 9 }))
        .is_ok());
}

#[tokio::test]
async fn test_rollback_closes_undeclared_channel() {
    let runtime = runtime_with(MapConfiguration::new());
    runtime
        .deploy(vec![unit_named(&load_units(&[units_dir()]).unwrap(), "urn:loom:orders")])
        .await
        .unwrap();

    let clash: LogicalUnit = serde_json::from_value(json!({
        "uri": "urn:loom:audit",
        "version": "1.0.0",
        "definitions": [
            {
                "name": "Auditor",
                "kind": "component",
                "implementation": "loom.publisher",
                "services": ["api"],
                "producers": [{ "name": "out", "channel": "audit" }]
            },
            {
                "name": "auditor-local",
                "kind": "binding",
                "transport": "local",
                "component": "Auditor",
                "endpoint": "api",
                "config": { "address": "local://orders/intake" }
            }
        ]
    }))
    .unwrap();

    let err = runtime.deploy(vec![clash]).await.unwrap_err();
    assert!(matches!(err, DeploymentError::Build(_)));
    assert_eq!(runtime.services().channels.state("audit"), ChannelState::Uncreated);
    assert_eq!(runtime.services().channels.state("orders"), ChannelState::Active);
}

/// Records the config of every `demo.counter` it builds.
#[derive(Default)]
struct CounterBuilder {
    built: Mutex<Vec<Value>>,
}

#[async_trait]
impl Builder for CounterBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        _ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let PhysicalSpec::Extension { config } = &definition.spec else {
            return Err(BuilderFault::Failed("not an extension".into()));
        };
        self.built.lock().push(config.clone());
        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Custom(Arc::new(config.clone())),
        ))
    }

    async fn remove(
        &self,
        _definition: &PhysicalDefinition,
        _ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        Ok(())
    }
}

#[tokio::test]
async fn test_extension_kind_registered_at_runtime() {
    let runtime = runtime_with(MapConfiguration::new().with("start", "10"));
    let kind = DefinitionKind::new("demo.counter");
    let builder = Arc::new(CounterBuilder::default());
    runtime.register_generator(kind.clone(), Arc::new(PassthroughGenerator));
    runtime.register_builder(kind, builder.clone());

    let unit = LogicalUnit::new("urn:demo", Version::new(0, 1, 0)).with_definition(
        LogicalDefinition::extension("counter", "demo.counter", json!({ "start": "${start}" })),
    );
    runtime.deploy(vec![unit]).await.unwrap();

    assert_eq!(*builder.built.lock(), vec![json!({ "start": "10" })]);
    assert!(runtime.services().artifacts.contains(&id("urn:demo", "counter")));
    assert!(runtime.shutdown().await.is_empty());
}

#[test]
fn test_load_units_reports_bad_descriptors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"uri\": \"urn:broken\" ").unwrap();

    let err = load_units(&[file.path()]).unwrap_err();
    assert!(format!("{err:#}").contains("parsing descriptor"));
}

#[test]
fn test_load_units_from_directory_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    for (file, uri) in [("b.json", "urn:b"), ("a.json", "urn:a")] {
        std::fs::write(
            dir.path().join(file),
            json!({ "uri": uri, "version": "1.0.0" }).to_string(),
        )
        .unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let units = load_units(&[dir.path()]).unwrap();
    let uris: Vec<&str> = units.iter().map(|u| u.uri.as_str()).collect();
    assert_eq!(uris, ["urn:a", "urn:b"]);
}
