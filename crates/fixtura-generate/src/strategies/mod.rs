use fixtura_core::TypeRef;

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::resolution::Resolution;

pub mod collections;
pub mod objects;
pub mod overrides;
pub mod primitives;

/// A single unit of resolution logic.
///
/// Returns `None` when the strategy does not handle the request's shape, so the
/// chain moves on without recording an attempt. A claimed request always
/// yields a [`Resolution`].
pub trait Strategy: Send + Sync {
    /// Stable identifier used in diagnostics and logs.
    fn id(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution>;

    /// When true, a failed claim ends the chain instead of letting later
    /// strategies try the request.
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Strategy backed by a closure.
pub struct FnStrategy<F> {
    id: &'static str,
    resolve: F,
}

/// Wrap a closure as a [`Strategy`].
pub fn from_fn<F>(id: &'static str, resolve: F) -> FnStrategy<F>
where
    F: Fn(&TypeRef, &mut ResolutionContext<'_>) -> Option<Resolution> + Send + Sync,
{
    FnStrategy { id, resolve }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&TypeRef, &mut ResolutionContext<'_>) -> Option<Resolution> + Send + Sync,
{
    fn id(&self) -> &'static str {
        self.id
    }

    fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Option<Resolution> {
        (self.resolve)(request, ctx)
    }
}

/// Register the strategies that always run before user strategies.
pub fn register_leading(chain: &mut ResolverChain) {
    overrides::register(chain);
}

/// Register the built-in shape strategies, tried after user strategies.
pub fn register_builtin(chain: &mut ResolverChain) {
    primitives::register(chain);
    collections::register(chain);
    objects::register(chain);
}
