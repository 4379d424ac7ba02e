use crate::error::GeneratorFault;
use crate::ports::{kind_mismatch, GenerationContext, Generator};
use crate::properties::resolve_map;
use shared_types::{
    DefinitionKind, DefinitionSpec, LogicalDefinition, PhysicalDefinition, PhysicalResource,
    PhysicalResourcePart, PhysicalSpec,
};
use std::collections::HashSet;

/// Resources keep their parts in declaration order; the builder opens them
/// in that order.
pub struct ResourceGenerator;

impl Generator for ResourceGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Resource(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::resource(), definition));
        };
        if spec.provider.is_empty() {
            return Err(GeneratorFault::Invalid("resource has no provider".into()));
        }

        let mut names = HashSet::new();
        let mut parts = Vec::with_capacity(spec.parts.len());
        for part in &spec.parts {
            if !names.insert(part.name.as_str()) {
                return Err(GeneratorFault::Invalid(format!(
                    "resource part '{}' declared twice",
                    part.name
                )));
            }
            parts.push(PhysicalResourcePart {
                name: part.name.clone(),
                provider: part.provider.clone(),
                config: resolve_map(&part.config, ctx.config)?,
            });
        }

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            DefinitionKind::resource(),
            PhysicalSpec::Resource(PhysicalResource {
                provider: spec.provider.clone(),
                config: resolve_map(&spec.config, ctx.config)?,
                parts,
            }),
        ))
    }
}
