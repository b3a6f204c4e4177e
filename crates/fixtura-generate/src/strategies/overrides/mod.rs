use std::sync::Arc;

use fixtura_core::TypeRef;

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::resolution::{Resolution, Unresolved, UnresolvedReason};
use crate::strategies::Strategy;

pub fn register(chain: &mut ResolverChain) {
    chain.push(Arc::new(FactoryStrategy));
    chain.push(Arc::new(SubtypeStrategy));
}

/// Invokes the factory registered for the exact request, if any. A claimed
/// request is never handed to another strategy.
pub struct FactoryStrategy;

impl Strategy for FactoryStrategy {
    fn id(&self) -> &'static str {
        "override.factory"
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let factory = ctx.config().factory(request)?;
        let resolution = match factory(ctx) {
            Ok(value) => Resolution::Resolved(value),
            Err(message) => {
                Resolution::unresolved(request, UnresolvedReason::FactoryFailed { message })
            }
        };
        Some(resolution)
    }
}

/// Resolves the type mapped to the request instead of the request itself.
pub struct SubtypeStrategy;

impl Strategy for SubtypeStrategy {
    fn id(&self) -> &'static str {
        "override.subtype"
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        let target = ctx.config().subtype(request)?;
        let resolution = match ctx.resolve(target) {
            Resolution::Resolved(value) => Resolution::Resolved(value),
            Resolution::Unresolved(cause) => {
                Resolution::Unresolved(Unresolved::dependency(request, target, cause))
            }
        };
        Some(resolution)
    }
}
