use crate::error::GeneratorFault;
use crate::ports::{GenerationContext, Generator};
use crate::properties::resolve_value;
use shared_types::{DefinitionSpec, LogicalDefinition, PhysicalDefinition, PhysicalSpec};

/// Generator for extension kinds whose builders consume the extension
/// configuration as-is, after placeholder substitution.
///
/// Register it under each extension kind that needs no generation logic of
/// its own.
pub struct PassthroughGenerator;

impl Generator for PassthroughGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Extension { config, .. } = &definition.spec else {
            return Err(GeneratorFault::Invalid(format!(
                "'{}' is not an extension definition",
                definition.kind()
            )));
        };

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            definition.kind(),
            PhysicalSpec::Extension {
                config: resolve_value(config, ctx.config)?,
            },
        ))
    }
}
