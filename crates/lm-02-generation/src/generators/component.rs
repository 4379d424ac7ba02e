use crate::error::GeneratorFault;
use crate::ports::{kind_mismatch, GenerationContext, Generator};
use crate::properties::resolve_map;
use shared_types::{
    ChannelEndpoint, DefinitionKind, DefinitionSpec, LogicalDefinition, PhysicalComponent,
    PhysicalDefinition, PhysicalEndpoint, PhysicalSpec, PhysicalSubscription,
};
use std::collections::{BTreeMap, HashSet};

/// Resolves properties, resource names and channel slots of a component.
pub struct ComponentGenerator;

impl Generator for ComponentGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Component(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::component(), definition));
        };
        if spec.implementation.is_empty() {
            return Err(GeneratorFault::Invalid("component has no implementation".into()));
        }

        let mut resources = BTreeMap::new();
        for name in &spec.resources {
            let id = ctx.local(name)?;
            if !matches!(
                ctx.unit.definition(name).map(|d| &d.spec),
                Some(DefinitionSpec::Resource(_))
            ) {
                return Err(GeneratorFault::Invalid(format!("'{name}' is not a resource")));
            }
            resources.insert(name.clone(), id);
        }

        let mut slots = HashSet::new();
        let endpoints = spec
            .producers
            .iter()
            .chain(&spec.consumers)
            .chain(&spec.subscriptions);
        for endpoint in endpoints {
            if !slots.insert(endpoint.name.as_str()) {
                return Err(GeneratorFault::Invalid(format!(
                    "channel slot '{}' declared twice",
                    endpoint.name
                )));
            }
            check_topic(ctx, endpoint)?;
        }

        let subscriptions = spec
            .subscriptions
            .iter()
            .map(|s| PhysicalSubscription {
                slot: s.name.clone(),
                channel: s.channel.clone(),
                topic: s.topic.clone(),
                subscriber_id: format!("{}#{}.{}", ctx.unit.uri, definition.name, s.name),
            })
            .collect();

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            DefinitionKind::component(),
            PhysicalSpec::Component(PhysicalComponent {
                implementation: spec.implementation.clone(),
                properties: resolve_map(&spec.properties, ctx.config)?,
                services: spec.services.clone(),
                references: spec.references.clone(),
                resources,
                producers: spec.producers.iter().map(endpoint).collect(),
                consumers: spec.consumers.iter().map(endpoint).collect(),
                subscriptions,
            }),
        ))
    }
}

fn endpoint(logical: &ChannelEndpoint) -> PhysicalEndpoint {
    PhysicalEndpoint {
        slot: logical.name.clone(),
        channel: logical.channel.clone(),
        topic: logical.topic.clone(),
    }
}

/// Channels declared by the same unit are checked here so that a bad topic
/// fails before anything is built. Other channels are checked on resolution.
fn check_topic(ctx: &GenerationContext<'_>, endpoint: &ChannelEndpoint) -> Result<(), GeneratorFault> {
    let (Some(topic), Some(DefinitionSpec::Channel(channel))) = (
        endpoint.topic.as_deref(),
        ctx.unit.definition(&endpoint.channel).map(|d| &d.spec),
    ) else {
        return Ok(());
    };
    if channel.topics.is_empty() || channel.topics.contains(topic) {
        Ok(())
    } else {
        Err(GeneratorFault::Invalid(format!(
            "channel '{}' has no topic '{topic}'",
            endpoint.channel
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_01_federation::resolve;
    use serde_json::json;
    use shared_types::{ChannelSpec, LogicalUnit, MapConfiguration, ResourceSpec, Version};

    fn generate(unit: &LogicalUnit, name: &str) -> Result<PhysicalDefinition, GeneratorFault> {
        let resolution = resolve(&[], &[], std::slice::from_ref(unit)).unwrap();
        let config = MapConfiguration::new().with("pool", "4");
        let ctx = GenerationContext::new(unit, resolution.namespace(&unit.uri).unwrap(), &config);
        ComponentGenerator.generate(unit.definition(name).unwrap(), &ctx)
    }

    fn orders_channel() -> LogicalDefinition {
        LogicalDefinition::channel(
            "orders",
            ChannelSpec {
                topics: ["created".to_string()].into(),
                payload: None,
            },
        )
    }

    #[test]
    fn test_component_generation() {
        let unit = LogicalUnit::new("unit:shop", Version::new(1, 0, 0))
            .with_definition(orders_channel())
            .with_definition(LogicalDefinition::resource(
                "db",
                ResourceSpec {
                    provider: "config".into(),
                    ..ResourceSpec::default()
                },
            ))
            .with_definition(LogicalDefinition::component(
                "checkout",
                shared_types::ComponentSpec {
                    implementation: "checkout".into(),
                    properties: [("pool".to_string(), json!("${pool}"))].into(),
                    resources: vec!["db".into()],
                    producers: vec![ChannelEndpoint::new("out", "orders", Some("created"))],
                    subscriptions: vec![ChannelEndpoint::new("feed", "orders", None)],
                    ..Default::default()
                },
            ));

        let physical = generate(&unit, "checkout").unwrap();
        assert_eq!(physical.id.to_string(), "unit:shop#checkout");
        let PhysicalSpec::Component(component) = physical.spec else {
            panic!("expected a component");
        };
        assert_eq!(component.properties["pool"], json!("4"));
        assert_eq!(component.resources["db"].name, "db");
        assert_eq!(component.producers[0].topic.as_deref(), Some("created"));
        assert_eq!(component.subscriptions[0].subscriber_id, "unit:shop#checkout.feed");
    }

    #[test]
    fn test_unknown_resource() {
        let unit = LogicalUnit::new("unit:shop", Version::new(1, 0, 0)).with_definition(
            LogicalDefinition::component(
                "checkout",
                shared_types::ComponentSpec {
                    implementation: "checkout".into(),
                    resources: vec!["db".into()],
                    ..Default::default()
                },
            ),
        );

        assert_eq!(
            generate(&unit, "checkout"),
            Err(GeneratorFault::UnknownDefinition { name: "db".into() })
        );
    }

    #[test]
    fn test_undeclared_topic_rejected() {
        let unit = LogicalUnit::new("unit:shop", Version::new(1, 0, 0))
            .with_definition(orders_channel())
            .with_definition(LogicalDefinition::component(
                "checkout",
                shared_types::ComponentSpec {
                    implementation: "checkout".into(),
                    producers: vec![ChannelEndpoint::new("out", "orders", Some("deleted"))],
                    ..Default::default()
                },
            ));

        assert!(matches!(generate(&unit, "checkout"), Err(GeneratorFault::Invalid(_))));
    }

    #[test]
    fn test_wrong_kind() {
        let unit = LogicalUnit::new("unit:shop", Version::new(1, 0, 0)).with_definition(orders_channel());
        assert!(matches!(
            generate(&unit, "orders"),
            Err(GeneratorFault::KindMismatch { .. })
        ));
    }
}
