//! Generator extension point

use crate::error::GeneratorFault;
use lm_01_federation::Namespace;
use shared_types::{
    ConfigurationProvider, DefinitionKind, LogicalDefinition, LogicalUnit, PhysicalDefinition,
    PhysicalId,
};

/// Everything a generator may read. Generation must not touch the running
/// system, so the context holds no runtime state.
pub struct GenerationContext<'a> {
    /// Unit that owns the definition.
    pub unit: &'a LogicalUnit,
    /// The unit's symbol table, including imports resolved by federation.
    pub namespace: &'a Namespace,
    /// Configuration collaborator.
    pub config: &'a dyn ConfigurationProvider,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        unit: &'a LogicalUnit,
        namespace: &'a Namespace,
        config: &'a dyn ConfigurationProvider,
    ) -> Self {
        Self {
            unit,
            namespace,
            config,
        }
    }

    /// Physical id of a definition in the same unit.
    pub fn local(&self, name: &str) -> Result<PhysicalId, GeneratorFault> {
        self.namespace
            .local(name)
            .ok_or_else(|| GeneratorFault::UnknownDefinition {
                name: name.to_string(),
            })
    }

    /// Physical id of a symbol reached through an imported package.
    pub fn imported(&self, package: &str, symbol: &str) -> Result<PhysicalId, GeneratorFault> {
        if self.namespace.exporter_of(package).is_none() {
            return Err(GeneratorFault::UnresolvedImport {
                package: package.to_string(),
            });
        }
        self.namespace
            .imported(package, symbol)
            .ok_or_else(|| GeneratorFault::UnexportedSymbol {
                package: package.to_string(),
                symbol: symbol.to_string(),
            })
    }

    /// Physical id of `definition` itself.
    #[must_use]
    pub fn id_of(&self, definition: &LogicalDefinition) -> PhysicalId {
        PhysicalId::new(self.unit.uri.clone(), definition.name.clone())
    }
}

/// Turns one logical definition into its physical counterpart.
///
/// Implementations must be deterministic: equal input yields equal output.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault>;
}

/// Fault for a generator handed a definition of another kind.
#[must_use]
pub fn kind_mismatch(expected: DefinitionKind, definition: &LogicalDefinition) -> GeneratorFault {
    GeneratorFault::KindMismatch {
        expected,
        found: definition.kind(),
    }
}
