use lm_03_building::{Component, ComponentContext, ComponentError, ComponentFactory};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::{ChannelError, ChannelEvent, ConsumerHandle, ProducerHandle};
use std::sync::Arc;
use tracing::debug;

/// Publishes the payload of every `publish` invocation.
pub struct Publisher {
    producer: ProducerHandle<Value>,
}

impl Component for Publisher {
    fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
        match operation {
            "publish" => {
                let delivered = self.producer.publish(&payload)?;
                Ok(json!({
                    "delivered": delivered,
                    "sequence": self.producer.published(),
                }))
            }
            other => Err(ComponentError::UnknownOperation {
                operation: other.to_string(),
            }),
        }
    }
}

/// Properties: `slot` (default `out`), the producer slot to publish on.
pub struct PublisherFactory;

impl ComponentFactory for PublisherFactory {
    fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError> {
        let slot: String = ctx.property_or("slot", "out".to_string())?;
        let producer = ctx
            .take_producer(&slot)
            .ok_or_else(|| ComponentError::Property {
                name: "slot".into(),
                reason: format!("no producer slot '{slot}'"),
            })?;
        Ok(Arc::new(Publisher { producer }))
    }
}

/// Keeps every payload it receives, in arrival order.
///
/// Subscription events arrive through `on_event`. Events buffered on the
/// consumer slot are pulled in before each invocation.
pub struct Collector {
    consumer: Mutex<Option<ConsumerHandle<Value>>>,
    received: Mutex<Vec<Value>>,
}

impl Collector {
    fn drain(&self) {
        let mut consumer = self.consumer.lock();
        let Some(handle) = consumer.as_mut() else {
            return;
        };
        loop {
            match handle.try_recv() {
                Ok(Some(payload)) => self.received.lock().push(payload),
                Ok(None) => break,
                Err(ChannelError::Closed { .. }) | Err(ChannelError::Released { .. }) => {
                    *consumer = None;
                    break;
                }
                Err(err) => {
                    debug!(error = %err, "Undecodable event skipped");
                }
            }
        }
    }
}

impl Component for Collector {
    fn invoke(&self, operation: &str, _payload: Value) -> Result<Value, ComponentError> {
        self.drain();
        match operation {
            "events" => Ok(Value::Array(self.received.lock().clone())),
            "count" => Ok(json!(self.received.lock().len())),
            "clear" => {
                let cleared = std::mem::take(&mut *self.received.lock());
                Ok(json!(cleared.len()))
            }
            other => Err(ComponentError::UnknownOperation {
                operation: other.to_string(),
            }),
        }
    }

    fn on_event(&self, _slot: &str, event: &ChannelEvent) {
        self.received.lock().push(event.payload.clone());
    }
}

/// Properties: `slot` (default `in`), an optional consumer slot.
pub struct CollectorFactory;

impl ComponentFactory for CollectorFactory {
    fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError> {
        let slot: String = ctx.property_or("slot", "in".to_string())?;
        Ok(Arc::new(Collector {
            consumer: Mutex::new(ctx.take_consumer(&slot)),
            received: Mutex::new(Vec::new()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::PhysicalId;
    use std::collections::BTreeMap;

    #[test]
    fn test_collector_keeps_event_order() {
        let collector = CollectorFactory
            .create(&mut ComponentContext::new(
                PhysicalId::new("urn:test".into(), "sink"),
                BTreeMap::new(),
            ))
            .unwrap();

        for id in 1..=3 {
            collector.on_event(
                "orders",
                &ChannelEvent {
                    channel: "orders".into(),
                    topic: Some("created".into()),
                    producer: 1,
                    sequence: id,
                    payload: json!({ "id": id }),
                },
            );
        }
        assert_eq!(
            collector.invoke("events", Value::Null).unwrap(),
            json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }])
        );
        assert_eq!(collector.invoke("clear", Value::Null).unwrap(), json!(3));
        assert_eq!(collector.invoke("count", Value::Null).unwrap(), json!(0));
    }

    #[test]
    fn test_publisher_requires_slot() {
        let result = PublisherFactory.create(&mut ComponentContext::new(
            PhysicalId::new("urn:test".into(), "source"),
            BTreeMap::new(),
        ));
        assert!(matches!(result, Err(ComponentError::Property { .. })));
    }
}
