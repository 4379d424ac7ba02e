//! Built-in builders

mod channel;
mod component;
mod resource;
mod wire;

pub use channel::ChannelBuilder;
pub use component::ComponentBuilder;
pub use resource::ResourceBuilder;
pub use wire::WireBuilder;

use crate::registry::BuilderRegistry;
use shared_types::DefinitionKind;
use std::sync::Arc;

/// Register the builders for the core physical kinds.
pub fn register_defaults(registry: &BuilderRegistry) {
    registry.register(DefinitionKind::component(), Arc::new(ComponentBuilder));
    registry.register(DefinitionKind::resource(), Arc::new(ResourceBuilder));
    registry.register(DefinitionKind::channel(), Arc::new(ChannelBuilder));
    registry.register(DefinitionKind::wire(), Arc::new(WireBuilder));
}

#[cfg(test)]
mod tests {
    use crate::component::{Component, ComponentContext, ComponentFactory};
    use crate::error::{BuildError, BuilderFault, ComponentError};
    use crate::ports::BuildContext;
    use crate::registry::BuilderRegistry;
    use crate::resource::{ResourceProvider, ResourceValue};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_bus::{ChannelEvent, ChannelState, ProducerHandle};
    use shared_types::{
        DefinitionKind, PhysicalChannel, PhysicalComponent, PhysicalDefinition, PhysicalEndpoint,
        PhysicalId, PhysicalResource, PhysicalResourcePart, PhysicalSpec, PhysicalSubscription,
        PhysicalWire,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Records events and forwards `emit` invocations to its producer.
    struct Recorder {
        events: Mutex<Vec<Value>>,
        producer: Option<ProducerHandle<Value>>,
        stopped: Mutex<bool>,
    }

    impl Component for Recorder {
        fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
            match (operation, &self.producer) {
                ("emit", Some(producer)) => Ok(json!(producer.publish(&payload)?)),
                ("count", _) => Ok(json!(self.events.lock().len())),
                (other, _) => Err(ComponentError::UnknownOperation {
                    operation: other.to_string(),
                }),
            }
        }

        fn on_event(&self, _slot: &str, event: &ChannelEvent) {
            self.events.lock().push(event.payload.clone());
        }

        fn stop(&self) {
            *self.stopped.lock() = true;
        }
    }

    struct RecorderFactory {
        created: Mutex<Vec<Arc<Recorder>>>,
    }

    impl ComponentFactory for RecorderFactory {
        fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError> {
            let recorder = Arc::new(Recorder {
                events: Mutex::new(Vec::new()),
                producer: ctx.take_producer("out"),
                stopped: Mutex::new(false),
            });
            self.created.lock().push(Arc::clone(&recorder));
            Ok(recorder)
        }
    }

    /// Remembers every open and close; refuses to open names starting with
    /// "bad" and to close names starting with "sticky".
    #[derive(Default)]
    struct Ledger {
        log: Mutex<Vec<String>>,
    }

    impl ResourceProvider for Ledger {
        fn open(&self, name: &str, _config: &BTreeMap<String, Value>) -> Result<ResourceValue, BuilderFault> {
            if name.starts_with("bad") {
                return Err(BuilderFault::Failed(format!("cannot open {name}")));
            }
            self.log.lock().push(format!("open {name}"));
            Ok(Arc::new(name.to_string()))
        }

        fn close(&self, name: &str, _value: &ResourceValue) -> Result<(), BuilderFault> {
            self.log.lock().push(format!("close {name}"));
            if name.starts_with("sticky") {
                return Err(BuilderFault::Failed(format!("cannot close {name}")));
            }
            Ok(())
        }
    }

    fn id(name: &str) -> PhysicalId {
        PhysicalId::new("unit:test".into(), name)
    }

    fn component(name: &str, spec: PhysicalComponent) -> PhysicalDefinition {
        PhysicalDefinition::new(id(name), DefinitionKind::component(), PhysicalSpec::Component(spec))
    }

    fn setup() -> (BuilderRegistry, BuildContext, Arc<RecorderFactory>) {
        let ctx = BuildContext::new("deployment-1");
        let factory = Arc::new(RecorderFactory {
            created: Mutex::new(Vec::new()),
        });
        ctx.components.register("recorder", factory.clone());
        (BuilderRegistry::with_defaults(), ctx, factory)
    }

    #[tokio::test]
    async fn test_component_with_channels_round_trip() {
        let (registry, ctx, factory) = setup();
        let channel = PhysicalDefinition::new(
            id("orders"),
            DefinitionKind::channel(),
            PhysicalSpec::Channel(PhysicalChannel {
                name: "orders".into(),
                ..PhysicalChannel::default()
            }),
        );
        let sender = component(
            "sender",
            PhysicalComponent {
                implementation: "recorder".into(),
                producers: vec![PhysicalEndpoint {
                    slot: "out".into(),
                    channel: "orders".into(),
                    topic: Some("created".into()),
                }],
                ..PhysicalComponent::default()
            },
        );
        let listener = component(
            "listener",
            PhysicalComponent {
                implementation: "recorder".into(),
                subscriptions: vec![PhysicalSubscription {
                    slot: "in".into(),
                    channel: "orders".into(),
                    topic: Some("created".into()),
                    subscriber_id: "unit:test#listener.in".into(),
                }],
                ..PhysicalComponent::default()
            },
        );

        registry.build(&channel, &ctx).await.unwrap();
        let sender_handle = registry.build(&sender, &ctx).await.unwrap();
        registry.build(&listener, &ctx).await.unwrap();

        let sender_instance = sender_handle.component().unwrap();
        sender_instance.invoke("emit", json!({"id": 1})).unwrap();
        sender_instance.invoke("emit", json!({"id": 2})).unwrap();

        let created = factory.created.lock().clone();
        assert_eq!(*created[1].events.lock(), vec![json!({"id": 1}), json!({"id": 2})]);

        registry.remove(&listener, &ctx).await.unwrap();
        registry.remove(&sender, &ctx).await.unwrap();
        registry.remove(&channel, &ctx).await.unwrap();

        assert!(*created[0].stopped.lock());
        assert!(ctx.artifacts.is_empty());
        assert_eq!(ctx.channels.state("orders"), ChannelState::Uncreated);
    }

    #[tokio::test]
    async fn test_wire_attach_and_detach() {
        let (registry, ctx, _) = setup();
        let client = component(
            "client",
            PhysicalComponent {
                implementation: "recorder".into(),
                references: vec!["backend".into()],
                ..PhysicalComponent::default()
            },
        );
        let backend = component(
            "backend",
            PhysicalComponent {
                implementation: "recorder".into(),
                services: vec!["api".into()],
                ..PhysicalComponent::default()
            },
        );
        let wire = PhysicalDefinition::new(
            id("client-backend"),
            DefinitionKind::wire(),
            PhysicalSpec::Wire(PhysicalWire {
                source: id("client"),
                reference: "backend".into(),
                target: id("backend"),
            }),
        );

        let client_handle = registry.build(&client, &ctx).await.unwrap();
        registry.build(&backend, &ctx).await.unwrap();
        let proxy = client_handle.component().unwrap().reference("backend").unwrap().clone();
        assert!(matches!(proxy.invoke("count", json!(null)), Err(ComponentError::Unwired { .. })));

        registry.build(&wire, &ctx).await.unwrap();
        assert_eq!(proxy.invoke("count", json!(null)), Ok(json!(0)));

        registry.remove(&wire, &ctx).await.unwrap();
        assert!(!proxy.is_wired());
    }

    #[tokio::test]
    async fn test_wire_to_missing_component_fails() {
        let (registry, ctx, _) = setup();
        let wire = PhysicalDefinition::new(
            id("w"),
            DefinitionKind::wire(),
            PhysicalSpec::Wire(PhysicalWire {
                source: id("client"),
                reference: "backend".into(),
                target: id("backend"),
            }),
        );

        let err = registry.build(&wire, &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Build { fault: BuilderFault::MissingArtifact { .. }, .. }
        ));
        assert!(ctx.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_resource_parts_unwind_on_failure() {
        let (registry, ctx, _) = setup();
        let ledger = Arc::new(Ledger::default());
        ctx.resources.register("ledger", ledger.clone());

        let part = |name: &str| PhysicalResourcePart {
            name: name.into(),
            provider: "ledger".into(),
            config: BTreeMap::new(),
        };
        let resource = PhysicalDefinition::new(
            id("logs"),
            DefinitionKind::resource(),
            PhysicalSpec::Resource(PhysicalResource {
                provider: "ledger".into(),
                config: BTreeMap::new(),
                parts: vec![part("console"), part("file"), part("bad-socket")],
            }),
        );

        let err = registry.build(&resource, &ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::Build { .. }));
        assert_eq!(
            *ledger.log.lock(),
            vec![
                "open logs",
                "open console",
                "open file",
                "close file",
                "close console",
                "close logs"
            ]
        );
        assert!(ctx.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_wins_over_unwind_failure() {
        let (registry, ctx, _) = setup();
        let ledger = Arc::new(Ledger::default());
        ctx.resources.register("ledger", ledger.clone());

        let part = |name: &str| PhysicalResourcePart {
            name: name.into(),
            provider: "ledger".into(),
            config: BTreeMap::new(),
        };
        let resource = PhysicalDefinition::new(
            id("logs"),
            DefinitionKind::resource(),
            PhysicalSpec::Resource(PhysicalResource {
                provider: "ledger".into(),
                config: BTreeMap::new(),
                parts: vec![part("console"), part("sticky-file"), part("bad-socket")],
            }),
        );

        let err = registry.build(&resource, &ctx).await.unwrap_err();
        match err {
            BuildError::Build { fault: BuilderFault::Failed(reason), .. } => {
                assert_eq!(reason, "cannot open bad-socket");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            *ledger.log.lock(),
            vec![
                "open logs",
                "open console",
                "open sticky-file",
                "close sticky-file",
                "close console",
                "close logs"
            ]
        );
        assert!(ctx.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_resource_reaches_component() {
        let (registry, ctx, _) = setup();
        let resource = PhysicalDefinition::new(
            id("settings"),
            DefinitionKind::resource(),
            PhysicalSpec::Resource(PhysicalResource {
                provider: "config".into(),
                config: [("limit".to_string(), json!(5))].into(),
                parts: Vec::new(),
            }),
        );
        registry.build(&resource, &ctx).await.unwrap();

        let settings = ctx.artifacts.resource(&id("settings")).unwrap();
        let map = settings.downcast::<BTreeMap<String, Value>>().unwrap();
        assert_eq!(map["limit"], json!(5));

        registry.remove(&resource, &ctx).await.unwrap();
        assert!(ctx.artifacts.resource(&id("settings")).is_none());
    }

    #[tokio::test]
    async fn test_channel_owned_by_another_deployment() {
        let (registry, ctx, _) = setup();
        let channel = PhysicalDefinition::new(
            id("orders"),
            DefinitionKind::channel(),
            PhysicalSpec::Channel(PhysicalChannel {
                name: "orders".into(),
                ..PhysicalChannel::default()
            }),
        );
        registry.build(&channel, &ctx).await.unwrap();

        let other = ctx.for_deployment("deployment-2");
        let err = registry.build(&channel, &other).await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Build { fault: BuilderFault::Channel(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_kind_and_implementation() {
        let (registry, ctx, _) = setup();
        let binding = PhysicalDefinition::new(
            id("http"),
            DefinitionKind::transport("http"),
            PhysicalSpec::Extension { config: json!({}) },
        );
        assert!(matches!(
            registry.build(&binding, &ctx).await,
            Err(BuildError::NoBuilder { .. })
        ));

        let missing = component(
            "ghost",
            PhysicalComponent {
                implementation: "nowhere".into(),
                ..PhysicalComponent::default()
            },
        );
        assert!(matches!(
            registry.build(&missing, &ctx).await,
            Err(BuildError::Build { fault: BuilderFault::UnknownImplementation { .. }, .. })
        ));
    }
}
