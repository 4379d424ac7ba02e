use crate::artifacts::{Artifact, ArtifactHandle};
use crate::component::{ComponentContext, ComponentInstance, ServiceProxy};
use crate::error::BuilderFault;
use crate::ports::{kind_mismatch, BuildContext, Builder};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{DefinitionKind, PhysicalDefinition, PhysicalSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Creates a component through its factory, handing it reference proxies,
/// channel handles and resources, then registers its subscriptions.
pub struct ComponentBuilder;

#[async_trait]
impl Builder for ComponentBuilder {
    async fn build(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<ArtifactHandle, BuilderFault> {
        let PhysicalSpec::Component(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::component(), definition));
        };
        let factory = ctx.components.get(&spec.implementation).ok_or_else(|| {
            BuilderFault::UnknownImplementation {
                implementation: spec.implementation.clone(),
            }
        })?;

        let references: BTreeMap<String, ServiceProxy> = spec
            .references
            .iter()
            .map(|r| (r.clone(), ServiceProxy::new(r.clone())))
            .collect();

        let mut component_ctx = ComponentContext::new(definition.id.clone(), spec.properties.clone());
        for proxy in references.values() {
            component_ctx.add_reference(proxy.clone());
        }
        for (name, id) in &spec.resources {
            let resource = ctx
                .artifacts
                .resource(id)
                .ok_or_else(|| BuilderFault::MissingArtifact { id: id.clone() })?;
            component_ctx.add_resource(name, resource);
        }
        for endpoint in &spec.producers {
            let handle = ctx
                .channels
                .producer::<Value>(&endpoint.channel, endpoint.topic.as_deref())?;
            ctx.channels.attribute(&endpoint.channel, &ctx.deployment);
            component_ctx.add_producer(&endpoint.slot, handle);
        }
        for endpoint in &spec.consumers {
            let handle = ctx
                .channels
                .consumer::<Value>(&endpoint.channel, endpoint.topic.as_deref())?;
            ctx.channels.attribute(&endpoint.channel, &ctx.deployment);
            component_ctx.add_consumer(&endpoint.slot, handle);
        }

        let component = factory.create(&mut component_ctx)?;
        // Handles the factory did not take are released here.
        drop(component_ctx);

        let instance = Arc::new(ComponentInstance::new(
            definition.id.clone(),
            spec.implementation.clone(),
            Arc::clone(&component),
            spec.services.clone(),
            references,
        ));

        for subscription in &spec.subscriptions {
            let target = Arc::downgrade(&component);
            let slot = subscription.slot.clone();
            let registered = ctx.channels.subscribe_events(
                &subscription.channel,
                &subscription.subscriber_id,
                subscription.topic.as_deref(),
                move |event| {
                    if let Some(component) = target.upgrade() {
                        component.on_event(&slot, event);
                    }
                },
            );
            match registered {
                Ok(handle) => {
                    ctx.channels.attribute(&subscription.channel, &ctx.deployment);
                    instance.add_subscription(handle);
                }
                Err(e) => {
                    instance.release_subscriptions();
                    component.stop();
                    return Err(e.into());
                }
            }
        }

        debug!(
            id = %definition.id,
            implementation = %spec.implementation,
            subscriptions = spec.subscriptions.len(),
            "Component created"
        );
        Ok(ArtifactHandle::new(
            definition.id.clone(),
            definition.kind.clone(),
            Artifact::Component(instance),
        ))
    }

    async fn remove(
        &self,
        definition: &PhysicalDefinition,
        ctx: &BuildContext,
    ) -> Result<(), BuilderFault> {
        let instance = ctx
            .artifacts
            .component(&definition.id)
            .ok_or_else(|| BuilderFault::MissingArtifact {
                id: definition.id.clone(),
            })?;

        instance.release_subscriptions();
        if let PhysicalSpec::Component(spec) = &definition.spec {
            for reference in &spec.references {
                if let Some(proxy) = instance.reference(reference) {
                    proxy.detach();
                }
            }
        }
        instance.component().stop();
        Ok(())
    }
}
