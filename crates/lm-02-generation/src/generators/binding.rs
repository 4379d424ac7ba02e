use crate::error::GeneratorFault;
use crate::ports::{kind_mismatch, GenerationContext, Generator};
use crate::properties::resolve_map;
use shared_types::{
    DefinitionKind, DefinitionSpec, LogicalDefinition, PhysicalBinding, PhysicalDefinition,
    PhysicalSpec,
};

/// Emits a `binding.<transport>` definition so that the transport's own
/// builder picks it up.
pub struct BindingGenerator;

impl Generator for BindingGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Binding(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::binding(), definition));
        };
        if spec.transport.is_empty() {
            return Err(GeneratorFault::Invalid("binding has no transport".into()));
        }

        let component = ctx.local(&spec.component)?;
        if let (Some(endpoint), Some(DefinitionSpec::Component(target))) = (
            spec.endpoint.as_deref(),
            ctx.unit.definition(&spec.component).map(|d| &d.spec),
        ) {
            let mut known = target.services.iter().chain(&target.references);
            if !known.any(|name| name == endpoint) {
                return Err(GeneratorFault::Invalid(format!(
                    "component '{}' has no service or reference '{endpoint}'",
                    spec.component
                )));
            }
        }

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            DefinitionKind::transport(&spec.transport),
            PhysicalSpec::Binding(PhysicalBinding {
                transport: spec.transport.clone(),
                component,
                endpoint: spec.endpoint.clone(),
                config: resolve_map(&spec.config, ctx.config)?,
            }),
        ))
    }
}
