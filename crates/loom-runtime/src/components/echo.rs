use lm_03_building::{Component, ComponentContext, ComponentError, ComponentFactory, ServiceProxy};
use serde_json::{json, Value};
use shared_types::PhysicalId;
use std::sync::Arc;

/// Answers `echo` with its payload and `id` with its physical id.
pub struct Echo {
    id: PhysicalId,
    tag: Option<String>,
}

impl Component for Echo {
    fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
        match operation {
            "echo" => Ok(match &self.tag {
                Some(tag) => json!({ "tag": tag, "payload": payload }),
                None => payload,
            }),
            "id" => Ok(Value::String(self.id.to_string())),
            other => Err(ComponentError::UnknownOperation {
                operation: other.to_string(),
            }),
        }
    }
}

/// Properties: `tag` (optional string).
pub struct EchoFactory;

impl ComponentFactory for EchoFactory {
    fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError> {
        Ok(Arc::new(Echo {
            id: ctx.id.clone(),
            tag: ctx.property_or("tag", None)?,
        }))
    }
}

/// Sends every invocation on through one reference.
pub struct Forwarder {
    next: ServiceProxy,
}

impl Component for Forwarder {
    fn invoke(&self, operation: &str, payload: Value) -> Result<Value, ComponentError> {
        self.next.invoke(operation, payload)
    }
}

/// Properties: `reference` (default `next`), naming the reference slot to
/// forward through.
pub struct ForwarderFactory;

impl ComponentFactory for ForwarderFactory {
    fn create(&self, ctx: &mut ComponentContext) -> Result<Arc<dyn Component>, ComponentError> {
        let reference: String = ctx.property_or("reference", "next".to_string())?;
        Ok(Arc::new(Forwarder {
            next: ctx.reference(&reference)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn context(properties: BTreeMap<String, Value>) -> ComponentContext {
        ComponentContext::new(PhysicalId::new("urn:test".into(), "c"), properties)
    }

    #[test]
    fn test_echo_tagging() {
        let plain = EchoFactory.create(&mut context(BTreeMap::new())).unwrap();
        assert_eq!(plain.invoke("echo", json!(3)).unwrap(), json!(3));
        assert_eq!(plain.invoke("id", Value::Null).unwrap(), json!("urn:test#c"));

        let tagged = EchoFactory
            .create(&mut context([("tag".to_string(), json!("t1"))].into()))
            .unwrap();
        assert_eq!(
            tagged.invoke("echo", json!(3)).unwrap(),
            json!({ "tag": "t1", "payload": 3 })
        );
        assert!(matches!(
            tagged.invoke("shout", Value::Null),
            Err(ComponentError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_forwarder_needs_its_reference() {
        assert!(matches!(
            ForwarderFactory.create(&mut context(BTreeMap::new())),
            Err(ComponentError::Unwired { reference }) if reference == "next"
        ));
    }
}
