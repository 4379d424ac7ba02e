use crate::error::GeneratorFault;
use crate::ports::{kind_mismatch, GenerationContext, Generator};
use shared_types::{
    DefinitionKind, DefinitionSpec, LogicalDefinition, PhysicalDefinition, PhysicalSpec,
    PhysicalWire, WireTarget,
};

/// Resolves both ends of a wire. Imported targets go through the unit's
/// namespace, so only symbols reachable over a federation wire resolve.
pub struct WireGenerator;

impl Generator for WireGenerator {
    fn generate(
        &self,
        definition: &LogicalDefinition,
        ctx: &GenerationContext<'_>,
    ) -> Result<PhysicalDefinition, GeneratorFault> {
        let DefinitionSpec::Wire(spec) = &definition.spec else {
            return Err(kind_mismatch(DefinitionKind::wire(), definition));
        };

        let source = ctx.local(&spec.source)?;
        match ctx.unit.definition(&spec.source).map(|d| &d.spec) {
            Some(DefinitionSpec::Component(component))
                if component.references.contains(&spec.reference) => {}
            Some(DefinitionSpec::Component(_)) => {
                return Err(GeneratorFault::Invalid(format!(
                    "component '{}' has no reference '{}'",
                    spec.source, spec.reference
                )))
            }
            _ => {
                return Err(GeneratorFault::Invalid(format!(
                    "wire source '{}' is not a component",
                    spec.source
                )))
            }
        }

        let target = match &spec.target {
            WireTarget::Local { component } => {
                let id = ctx.local(component)?;
                if !matches!(
                    ctx.unit.definition(component).map(|d| &d.spec),
                    Some(DefinitionSpec::Component(_))
                ) {
                    return Err(GeneratorFault::Invalid(format!(
                        "wire target '{component}' is not a component"
                    )));
                }
                id
            }
            WireTarget::Imported { package, symbol } => ctx.imported(package, symbol)?,
        };

        Ok(PhysicalDefinition::new(
            ctx.id_of(definition),
            DefinitionKind::wire(),
            PhysicalSpec::Wire(PhysicalWire {
                source,
                reference: spec.reference.clone(),
                target,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lm_01_federation::resolve;
    use shared_types::{ComponentSpec, LogicalUnit, MapConfiguration, Version, VersionRange, WireSpec};

    fn component(name: &str, references: &[&str]) -> LogicalDefinition {
        LogicalDefinition::component(
            name,
            ComponentSpec {
                implementation: name.into(),
                references: references.iter().map(|r| r.to_string()).collect(),
                services: vec!["api".into()],
                ..ComponentSpec::default()
            },
        )
    }

    fn imported_wire(symbol: &str) -> LogicalDefinition {
        LogicalDefinition::wire(
            "to-pricing",
            WireSpec {
                source: "checkout".into(),
                reference: "pricing".into(),
                target: WireTarget::Imported {
                    package: "pricing".into(),
                    symbol: symbol.into(),
                },
            },
        )
    }

    fn units(symbol: &str) -> (LogicalUnit, LogicalUnit) {
        let lib = LogicalUnit::new("unit:lib", Version::new(1, 5, 0))
            .exporting("pricing", ["calculator"])
            .with_definition(component("calculator", &[]));
        let app = LogicalUnit::new("unit:app", Version::new(1, 0, 0))
            .importing("pricing", VersionRange::any())
            .with_definition(component("checkout", &["pricing"]))
            .with_definition(imported_wire(symbol));
        (lib, app)
    }

    fn generate_wire(lib: &LogicalUnit, app: &LogicalUnit) -> Result<PhysicalDefinition, GeneratorFault> {
        let resolution = resolve(&[lib], &[], std::slice::from_ref(app)).unwrap();
        let config = MapConfiguration::new();
        let ctx = GenerationContext::new(app, resolution.namespace(&app.uri).unwrap(), &config);
        WireGenerator.generate(app.definition("to-pricing").unwrap(), &ctx)
    }

    #[test]
    fn test_imported_target_resolves_to_exporter() {
        let (lib, app) = units("calculator");
        let physical = generate_wire(&lib, &app).unwrap();
        let PhysicalSpec::Wire(wire) = physical.spec else {
            panic!("expected a wire");
        };
        assert_eq!(wire.source.to_string(), "unit:app#checkout");
        assert_eq!(wire.target.to_string(), "unit:lib#calculator");
    }

    #[test]
    fn test_unexported_symbol() {
        let (lib, app) = units("internal");
        assert_eq!(
            generate_wire(&lib, &app),
            Err(GeneratorFault::UnexportedSymbol {
                package: "pricing".into(),
                symbol: "internal".into()
            })
        );
    }

    #[test]
    fn test_unknown_reference() {
        let unit = LogicalUnit::new("unit:app", Version::new(1, 0, 0))
            .with_definition(component("checkout", &[]))
            .with_definition(component("tax", &[]))
            .with_definition(LogicalDefinition::wire(
                "w",
                WireSpec {
                    source: "checkout".into(),
                    reference: "tax".into(),
                    target: WireTarget::Local {
                        component: "tax".into(),
                    },
                },
            ));
        let resolution = resolve(&[], &[], std::slice::from_ref(&unit)).unwrap();
        let config = MapConfiguration::new();
        let ctx = GenerationContext::new(&unit, resolution.namespace(&unit.uri).unwrap(), &config);

        assert!(matches!(
            WireGenerator.generate(unit.definition("w").unwrap(), &ctx),
            Err(GeneratorFault::Invalid(_))
        ));
    }
}
