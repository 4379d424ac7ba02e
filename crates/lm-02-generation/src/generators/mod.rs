//! Built-in generators

mod binding;
mod channel;
mod component;
mod passthrough;
mod resource;
mod wire;

pub use binding::BindingGenerator;
pub use channel::ChannelGenerator;
pub use component::ComponentGenerator;
pub use passthrough::PassthroughGenerator;
pub use resource::ResourceGenerator;
pub use wire::WireGenerator;

use crate::registry::GeneratorRegistry;
use shared_types::DefinitionKind;
use std::sync::Arc;

/// Register the generators for every kind the core model defines.
pub fn register_defaults(registry: &GeneratorRegistry) {
    registry.register(DefinitionKind::component(), Arc::new(ComponentGenerator));
    registry.register(DefinitionKind::resource(), Arc::new(ResourceGenerator));
    registry.register(DefinitionKind::channel(), Arc::new(ChannelGenerator));
    registry.register(DefinitionKind::wire(), Arc::new(WireGenerator));
    registry.register(DefinitionKind::binding(), Arc::new(BindingGenerator));
}
