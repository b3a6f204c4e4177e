use std::sync::Arc;

use rand::Rng;

use fixtura_core::{TypeRef, TypeShape, Value};

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::resolution::{Resolution, Unresolved};
use crate::strategies::Strategy;

pub fn register(chain: &mut ResolverChain) {
    chain.push(Arc::new(OptionalStrategy));
    chain.push(Arc::new(CollectionStrategy));
}

/// `Option<T>`: null with the configured probability, otherwise a `T`.
pub struct OptionalStrategy;

impl Strategy for OptionalStrategy {
    fn id(&self) -> &'static str {
        "collection.optional"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let TypeShape::Optional(inner) = ctx.describe(request)? else {
            return None;
        };
        let null_probability = ctx.options().null_probability;
        if ctx.rng().random_bool(null_probability) {
            return Some(Resolution::Resolved(Value::Null));
        }
        let resolution = match ctx.resolve(&inner) {
            Resolution::Resolved(value) => Resolution::Resolved(value),
            Resolution::Unresolved(cause) => {
                Resolution::Unresolved(Unresolved::dependency(request, &inner, cause))
            }
        };
        Some(resolution)
    }
}

/// Sequences, sets and maps of a random size.
///
/// Set elements and map keys drawn twice collapse, so the result may hold
/// fewer entries than the drawn count.
pub struct CollectionStrategy;

impl Strategy for CollectionStrategy {
    fn id(&self) -> &'static str {
        "collection"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let shape = ctx.describe(request)?;
        if !matches!(
            shape,
            TypeShape::Sequence(_) | TypeShape::Set(_) | TypeShape::Map(_, _)
        ) {
            return None;
        }

        let options = ctx.options();
        let count = ctx
            .rng()
            .random_range(options.collection_min..=options.collection_max);

        let result = match shape {
            TypeShape::Sequence(element) => build_sequence(request, &element, count, ctx),
            TypeShape::Set(element) => build_set(request, &element, count, ctx),
            TypeShape::Map(key, value) => build_map(request, &key, &value, count, ctx),
            _ => return None,
        };
        Some(result.into())
    }
}

fn resolve_dependency(
    request: &TypeRef,
    dependency: &TypeRef,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value, Unresolved> {
    ctx.resolve(dependency)
        .into_result()
        .map_err(|cause| Unresolved::dependency(request, dependency, cause))
}

fn build_sequence(
    request: &TypeRef,
    element: &TypeRef,
    count: usize,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value, Unresolved> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(resolve_dependency(request, element, ctx)?);
    }
    Ok(Value::List(items))
}

fn build_set(
    request: &TypeRef,
    element: &TypeRef,
    count: usize,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value, Unresolved> {
    let mut items: Vec<Value> = Vec::with_capacity(count);
    for _ in 0..count {
        let item = resolve_dependency(request, element, ctx)?;
        if !items.contains(&item) {
            items.push(item);
        }
    }
    Ok(Value::Set(items))
}

fn build_map(
    request: &TypeRef,
    key: &TypeRef,
    value: &TypeRef,
    count: usize,
    ctx: &mut ResolutionContext<'_>,
) -> Result<Value, Unresolved> {
    let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count);
    for _ in 0..count {
        let entry_key = resolve_dependency(request, key, ctx)?;
        let entry_value = resolve_dependency(request, value, ctx)?;
        if !entries.iter().any(|(existing, _)| existing == &entry_key) {
            entries.push((entry_key, entry_value));
        }
    }
    Ok(Value::Map(entries))
}

#[cfg(test)]
mod tests {
    use fixtura_core::TypeDef;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::{Configuration, ConfigurationBuilder};
    use crate::resolution::UnresolvedReason;

    fn resolve(config: &Configuration, request: &str, seed: u64) -> Resolution {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = ResolutionContext::new(config, &mut rng);
        ctx.resolve(&TypeRef::parse(request).expect("parse"))
    }

    #[test]
    fn sequences_respect_configured_bounds() {
        let config = ConfigurationBuilder::new()
            .collection_size(2, 5)
            .build()
            .expect("build configuration");
        let mut sizes = std::collections::BTreeSet::new();
        for seed in 0..100 {
            let value = resolve(&config, "List<i32>", seed)
                .into_result()
                .expect("resolved");
            let items = value.elements().expect("list");
            assert!(items.iter().all(|item| matches!(item, Value::Int(_))));
            sizes.insert(items.len());
        }
        assert_eq!(sizes.into_iter().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn sets_collapse_duplicates() {
        let registry = fixtura_core::TypeRegistry::new()
            .with(TypeDef::enumeration("Coin", ["Heads", "Tails"]))
            .expect("register");
        let config = ConfigurationBuilder::new()
            .registry(registry)
            .repeat_count(10)
            .build()
            .expect("build configuration");
        let value = resolve(&config, "Set<Coin>", 1)
            .into_result()
            .expect("resolved");
        let items = value.elements().expect("set");
        assert!(!items.is_empty() && items.len() <= 2);
    }

    #[test]
    fn map_keys_are_unique() {
        let config = ConfigurationBuilder::new()
            .repeat_count(8)
            .build()
            .expect("build configuration");
        let value = resolve(&config, "Map<bool, string>", 3)
            .into_result()
            .expect("resolved");
        let entries = value.entries().expect("map");
        assert!(entries.len() <= 2);
        assert!(
            entries
                .iter()
                .all(|(key, value)| key.as_bool().is_some() && value.as_str().is_some())
        );
    }

    #[test]
    fn failing_elements_fail_the_collection() {
        let config = ConfigurationBuilder::new()
            .repeat_count(1)
            .build()
            .expect("build configuration");
        let Resolution::Unresolved(unresolved) = resolve(&config, "List<Ghost>", 4) else {
            panic!("expected unresolved");
        };
        let dependency = &unresolved.attempts[0].cause;
        assert_eq!(
            dependency.reason,
            UnresolvedReason::DependencyFailed {
                dependency: TypeRef::named("Ghost")
            }
        );
    }

    #[test]
    fn empty_collections_never_resolve_elements() {
        let config = ConfigurationBuilder::new()
            .repeat_count(0)
            .build()
            .expect("build configuration");
        let value = resolve(&config, "List<Ghost>", 5)
            .into_result()
            .expect("empty list resolves");
        assert_eq!(value, Value::List(Vec::new()));
    }

    #[test]
    fn optionals_produce_nulls_and_values() {
        let config = ConfigurationBuilder::new()
            .null_probability(0.5)
            .build()
            .expect("build configuration");
        let values: Vec<Value> = (0..64)
            .map(|seed| {
                resolve(&config, "Option<u8>", seed)
                    .into_result()
                    .expect("resolved")
            })
            .collect();
        assert!(values.iter().any(Value::is_null));
        assert!(values.iter().any(|value| matches!(value, Value::UInt(_))));
    }
}
