use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use fixtura_core::TypeRef;

use crate::context::ResolutionContext;
use crate::resolution::{Attempt, Resolution, Unresolved, UnresolvedReason};
use crate::strategies::Strategy;

/// Ordered list of strategies; the first one to resolve a request wins.
#[derive(Clone, Default)]
pub struct ResolverChain {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy; it is tried after every strategy already present.
    pub fn push(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy ids in the order they are tried.
    pub fn strategy_ids(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.id()).collect()
    }

    /// Try each strategy in order until one resolves `request`.
    ///
    /// Every strategy is consulted at most once. Strategies that claim the
    /// request and fail are recorded as attempts on the returned diagnostic;
    /// a terminal strategy's failure stops the search.
    pub fn resolve(&self, request: &TypeRef, ctx: &mut ResolutionContext<'_>) -> Resolution {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let Some(resolution) = strategy.resolve(request, ctx) else {
                continue;
            };
            match resolution {
                Resolution::Resolved(value) => {
                    trace!(
                        request = %request,
                        strategy = strategy.id(),
                        depth = ctx.depth(),
                        "resolved"
                    );
                    return Resolution::Resolved(value);
                }
                Resolution::Unresolved(cause) => {
                    trace!(
                        request = %request,
                        strategy = strategy.id(),
                        reason = %cause.reason,
                        "strategy failed"
                    );
                    attempts.push(Attempt {
                        strategy: strategy.id(),
                        cause,
                    });
                    if strategy.is_terminal() {
                        break;
                    }
                }
            }
        }

        let reason = if !attempts.is_empty() {
            UnresolvedReason::StrategiesFailed
        } else if ctx.describe(request).is_none() {
            UnresolvedReason::UnknownType
        } else {
            UnresolvedReason::NoStrategy
        };
        debug!(
            request = %request,
            reason = %reason,
            attempts = attempts.len(),
            "request unresolved"
        );
        Resolution::Unresolved(Unresolved::new(request.clone(), reason).with_attempts(attempts))
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("strategies", &self.strategy_ids())
            .finish()
    }
}
