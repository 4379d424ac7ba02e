use crate::error::GeneratorFault;
use crate::ports::{kind_mismatch, GenerationContext, Generator};
use shared_types::{
    DefinitionKind, DefinitionSpec, LogicalDefinition, PhysicalChannel, PhysicalDefinition,
    PhysicalSpec,
};

/// The definition name is the process-wide channel name.
pub struct ChannelGenerator;

impl Generator for ChannelGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Channel(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::channel(), definition));
        };

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            DefinitionKind::channel(),
            PhysicalSpec::Channel(PhysicalChannel {
                name: definition.name.clone(),
                topics: spec.topics.clone(),
                payload: spec.payload.clone(),
            }),
        ))
    }
}
