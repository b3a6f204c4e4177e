use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::trace;

use fixtura_core::{Constructor, TypeRef, TypeShape, Value};

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::resolution::{Resolution, Unresolved, UnresolvedReason};
use crate::strategies::Strategy;

pub fn register(chain: &mut ResolverChain) {
    chain.push(Arc::new(AbstractStrategy));
    chain.push(Arc::new(ObjectStrategy));
}

/// Builds an abstract type through one of its implementations, picked at
/// random; the others are tried in turn when it fails.
pub struct AbstractStrategy;

impl Strategy for AbstractStrategy {
    fn id(&self) -> &'static str {
        "object.abstract"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let TypeShape::Abstract(mut implementations) = ctx.describe(request)? else {
            return None;
        };
        if implementations.is_empty() {
            return Some(Resolution::unresolved(
                request,
                UnresolvedReason::NoImplementation,
            ));
        }
        implementations.shuffle(ctx.rng());

        let mut causes = Vec::new();
        for implementation in &implementations {
            match ctx.resolve(implementation) {
                Resolution::Resolved(value) => return Some(Resolution::Resolved(value)),
                Resolution::Unresolved(cause) => causes.push(cause),
            }
        }
        Some(Resolution::Unresolved(
            Unresolved::new(request.clone(), UnresolvedReason::ImplementationsFailed)
                .with_causes(causes),
        ))
    }
}

/// Builds a concrete type by invoking one of its constructors.
pub struct ObjectStrategy;

impl Strategy for ObjectStrategy {
    fn id(&self) -> &'static str {
        "object.constructor"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let TypeShape::Object(mut constructors) = ctx.describe(request)? else {
            return None;
        };
        if constructors.is_empty() {
            return Some(Resolution::unresolved(request, UnresolvedReason::NoConstructor));
        }
        order_candidates(&mut constructors);

        let mut causes = Vec::new();
        for constructor in &constructors {
            match invoke(request, constructor, ctx) {
                Ok(value) => return Some(Resolution::Resolved(value)),
                Err(cause) => {
                    trace!(
                        request = %request,
                        constructor = %constructor.name,
                        reason = %cause.reason,
                        "constructor failed"
                    );
                    causes.push(cause);
                }
            }
        }
        Some(Resolution::Unresolved(
            Unresolved::new(request.clone(), UnresolvedReason::ConstructorsFailed)
                .with_causes(causes),
        ))
    }
}

/// Designated constructors first, then the ones taking the most parameters.
/// Declaration order breaks ties.
fn order_candidates(constructors: &mut [Constructor]) {
    constructors.sort_by(|a, b| {
        b.designated
            .cmp(&a.designated)
            .then_with(|| b.params.len().cmp(&a.params.len()))
    });
}

fn invoke(
    request: &TypeRef,
    constructor: &Constructor,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value, Unresolved> {
    let config = ctx.config();
    let mut arguments = Vec::with_capacity(constructor.params.len());

    for param in &constructor.params {
        let value = match config.property(request.name(), &param.name) {
            Some(factory) => factory(&mut *ctx).map_err(|message| {
                Unresolved::new(request.clone(), UnresolvedReason::FactoryFailed { message })
            })?,
            None => ctx.resolve(&param.ty).into_result().map_err(|cause| {
                Unresolved::new(
                    request.clone(),
                    UnresolvedReason::ParameterFailed {
                        constructor: constructor.name.clone(),
                        parameter: param.name.clone(),
                    },
                )
                .with_cause(cause)
            })?,
        };
        arguments.push((param.name.clone(), value));
    }

    match &constructor.build {
        Some(build) => build(&arguments).map_err(|message| {
            Unresolved::new(
                request.clone(),
                UnresolvedReason::ConstructorFailed {
                    constructor: constructor.name.clone(),
                    message,
                },
            )
        }),
        None => Ok(Value::Object {
            type_name: request.to_string(),
            fields: arguments,
        }),
    }
}

#[cfg(test)]
mod tests {
    use fixtura_core::{TypeDef, TypeRegistry};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::{Configuration, ConfigurationBuilder};

    fn resolve(config: &Configuration, request: &str, seed: u64) -> Resolution {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = ResolutionContext::new(config, &mut rng);
        ctx.resolve(&TypeRef::parse(request).expect("parse"))
    }

    fn config_for(registry: TypeRegistry) -> Configuration {
        ConfigurationBuilder::new()
            .registry(registry)
            .build()
            .expect("build configuration")
    }

    #[test]
    fn objects_carry_every_parameter() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object(
                "Point",
                vec![
                    Constructor::new("new")
                        .param("x", TypeRef::named("i32"))
                        .param("y", TypeRef::named("i32")),
                ],
            ))
            .expect("register");
        let value = resolve(&config_for(registry), "Point", 1)
            .into_result()
            .expect("resolved");
        assert_eq!(value.type_name(), Some("Point"));
        assert!(value.field("x").and_then(Value::as_i64).is_some());
        assert!(value.field("y").and_then(Value::as_i64).is_some());
    }

    #[test]
    fn designated_constructor_wins_over_larger_ones() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object(
                "Span",
                vec![
                    Constructor::new("full")
                        .param("start", TypeRef::named("u32"))
                        .param("end", TypeRef::named("u32")),
                    Constructor::new("empty").designated(),
                ],
            ))
            .expect("register");
        let value = resolve(&config_for(registry), "Span", 2)
            .into_result()
            .expect("resolved");
        assert_eq!(
            value,
            Value::Object {
                type_name: "Span".to_string(),
                fields: Vec::new()
            }
        );
    }

    #[test]
    fn falls_back_to_the_next_constructor() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object(
                "Account",
                vec![
                    Constructor::new("with_owner")
                        .param("id", TypeRef::named("uuid"))
                        .param("owner", TypeRef::named("Ghost")),
                    Constructor::new("anonymous").param("id", TypeRef::named("uuid")),
                ],
            ))
            .expect("register");
        let value = resolve(&config_for(registry), "Account", 3)
            .into_result()
            .expect("resolved");
        assert!(matches!(value.field("id"), Some(Value::Uuid(_))));
        assert!(value.field("owner").is_none());
    }

    #[test]
    fn build_functions_shape_the_value() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object(
                "Celsius",
                vec![
                    Constructor::new("from_float")
                        .param("degrees", TypeRef::named("f64"))
                        .with_build(|args| {
                            let degrees = args[0].1.as_f64().ok_or("degrees must be a float")?;
                            Ok(Value::Float(degrees.round()))
                        }),
                ],
            ))
            .expect("register");
        let value = resolve(&config_for(registry), "Celsius", 4)
            .into_result()
            .expect("resolved");
        let degrees = value.as_f64().expect("float");
        assert_eq!(degrees, degrees.round());
    }

    #[test]
    fn every_constructor_failure_is_reported() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object(
                "Broken",
                vec![
                    Constructor::new("lookup").param("ghost", TypeRef::named("Ghost")),
                    Constructor::new("refuse").with_build(|_| Err("refused".to_string())),
                ],
            ))
            .expect("register");
        let Resolution::Unresolved(unresolved) = resolve(&config_for(registry), "Broken", 5) else {
            panic!("expected unresolved");
        };
        let object_failure = &unresolved.attempts[0].cause;
        assert_eq!(object_failure.reason, UnresolvedReason::ConstructorsFailed);
        let reasons: Vec<&UnresolvedReason> =
            object_failure.causes.iter().map(|cause| &cause.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &UnresolvedReason::ParameterFailed {
                    constructor: "lookup".to_string(),
                    parameter: "ghost".to_string(),
                },
                &UnresolvedReason::ConstructorFailed {
                    constructor: "refuse".to_string(),
                    message: "refused".to_string(),
                },
            ]
        );
    }

    #[test]
    fn objects_without_constructors_are_unresolved() {
        let registry = TypeRegistry::new()
            .with(TypeDef::object("Opaque", Vec::new()))
            .expect("register");
        let Resolution::Unresolved(unresolved) = resolve(&config_for(registry), "Opaque", 6) else {
            panic!("expected unresolved");
        };
        assert_eq!(
            unresolved.attempts[0].cause.reason,
            UnresolvedReason::NoConstructor
        );
    }

    #[test]
    fn property_overrides_replace_parameter_resolution() {
        let registry = TypeRegistry::new()
            .with(
                TypeDef::object(
                    "Boxed",
                    vec![Constructor::new("new").param("inner", TypeRef::named("T"))],
                )
                .with_generics(["T"]),
            )
            .expect("register");
        let config = ConfigurationBuilder::new()
            .registry(registry)
            .property_value("Boxed", "inner", Value::Text("fixed".to_string()))
            .build()
            .expect("build configuration");
        let value = resolve(&config, "Boxed<i32>", 7)
            .into_result()
            .expect("resolved");
        assert_eq!(value.type_name(), Some("Boxed<i32>"));
        assert_eq!(value.field("inner"), Some(&Value::Text("fixed".to_string())));
    }

    #[test]
    fn abstract_types_pick_every_implementation_over_time() {
        let registry = TypeRegistry::new()
            .with(TypeDef::abstract_type(
                "Shape",
                vec![TypeRef::named("Circle"), TypeRef::named("Square")],
            ))
            .and_then(|registry| {
                registry.with(TypeDef::object(
                    "Circle",
                    vec![Constructor::new("new").param("radius", TypeRef::named("f64"))],
                ))
            })
            .and_then(|registry| {
                registry.with(TypeDef::object(
                    "Square",
                    vec![Constructor::new("new").param("side", TypeRef::named("f64"))],
                ))
            })
            .expect("register");
        let config = config_for(registry);
        let mut seen = std::collections::BTreeSet::new();
        for seed in 0..40 {
            let value = resolve(&config, "Shape", seed)
                .into_result()
                .expect("resolved");
            seen.insert(value.type_name().map(str::to_string));
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn abstract_types_skip_failing_implementations() {
        let registry = TypeRegistry::new()
            .with(TypeDef::abstract_type(
                "Source",
                vec![TypeRef::named("Ghost"), TypeRef::named("bool")],
            ))
            .expect("register");
        let config = config_for(registry);
        for seed in 0..10 {
            let value = resolve(&config, "Source", seed)
                .into_result()
                .expect("resolved");
            assert!(value.as_bool().is_some());
        }
    }

    #[test]
    fn abstract_types_without_implementations_are_unresolved() {
        let registry = TypeRegistry::new()
            .with(TypeDef::abstract_type("Plugin", Vec::new()))
            .expect("register");
        let Resolution::Unresolved(unresolved) = resolve(&config_for(registry), "Plugin", 8) else {
            panic!("expected unresolved");
        };
        assert_eq!(
            unresolved.attempts[0].cause.reason,
            UnresolvedReason::NoImplementation
        );
    }
}
