//! # Generator Registry
//!
//! Kind-to-generator map. Read on every generation, written only when an
//! extension registers, so the map sits behind a reader/writer lock and the
//! generator itself runs after the lock is released.

use crate::error::{GenerationError, GenerationResult};
use crate::generators;
use crate::ports::{GenerationContext, Generator};
use parking_lot::RwLock;
use shared_types::{DefinitionKind, LogicalDefinition, PhysicalDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Generators keyed by definition kind.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: RwLock<HashMap<DefinitionKind, Arc<dyn Generator>>>,
}

impl GeneratorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in generators for component, resource,
    /// channel, wire and binding definitions.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        generators::register_defaults(&registry);
        registry
    }

    /// Associate `kind` with `generator`. A later registration for the same
    /// kind replaces the earlier one, which is returned.
    pub fn register(
        &self,
        kind: DefinitionKind,
        generator: Arc<dyn Generator>,
    ) -> Option<Arc<dyn Generator>> {
        let previous = self.generators.write().insert(kind.clone(), generator);
        if previous.is_some() {
            info!(kind = %kind, "Generator replaced");
        } else {
            debug!(kind = %kind, "Generator registered");
        }
        previous
    }

    #[must_use]
    pub fn contains(&self, kind: &DefinitionKind) -> bool {
        self.generators.read().contains_key(kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<DefinitionKind> {
        let mut kinds: Vec<DefinitionKind> = self.generators.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Generate the physical definition for `definition`, dispatching on its
    /// runtime kind.
    pub fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> GenerationResult<PhysicalDefinition> {
        let kind = definition.kind();
        let generator = self.generators.read().get(&kind).cloned();
        let Some(generator) = generator else {
            return Err(GenerationError::NoGenerator {
                unit: ctx.unit.uri.clone(),
                definition: definition.name.clone(),
                kind,
            });
        };

        let physical = generator
            .generate(definition, ctx)
            .map_err(|fault| GenerationError::Generation {
                unit: ctx.unit.uri.clone(),
                definition: definition.name.clone(),
                kind: kind.clone(),
                fault,
            })?;

        debug!(
            unit = %ctx.unit.uri,
            definition = %definition.name,
            kind = %kind,
            physical_kind = %physical.kind,
            "Definition generated"
        );
        Ok(physical)
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
