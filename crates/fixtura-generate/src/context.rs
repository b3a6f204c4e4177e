use rand::RngCore;
use tracing::{debug, warn};

use fixtura_core::{TypeRef, TypeShape, Value};

use crate::config::Configuration;
use crate::model::{CircularPolicy, GenerateOptions};
use crate::resolution::{Resolution, Unresolved, UnresolvedReason};

/// Per-invocation state threaded through recursive resolution.
///
/// One context serves a single top-level request and all of its nested
/// requests; it is never shared between top-level calls.
pub struct ResolutionContext<'a> {
    config: &'a Configuration,
    rng: &'a mut dyn RngCore,
    stack: Vec<TypeRef>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(config: &'a Configuration, rng: &'a mut dyn RngCore) -> Self {
        Self {
            config,
            rng,
            stack: Vec::new(),
        }
    }

    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    pub fn options(&self) -> &'a GenerateOptions {
        self.config.options()
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    /// Shape of `ty` according to the configured type descriptor.
    pub fn describe(&self, ty: &TypeRef) -> Option<TypeShape> {
        self.config.descriptor().describe(ty)
    }

    /// Requests currently being built, outermost first.
    pub fn stack(&self) -> &[TypeRef] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolve `request` through the configured chain.
    ///
    /// A request that already appears on the active stack more than
    /// `recursion_limit` times, or that would nest deeper than `max_depth`,
    /// is short-circuited according to the circular policy instead of
    /// recursing again.
    pub fn resolve(&mut self, request: &TypeRef) -> Resolution {
        let options = self.options();
        let occurrences = self.stack.iter().filter(|active| *active == request).count();
        if occurrences > options.recursion_limit || self.depth() >= options.max_depth {
            let mut stack = self.stack.clone();
            stack.push(request.clone());
            return match options.circular_policy {
                CircularPolicy::Unresolved => {
                    debug!(request = %request, depth = self.depth(), "circular dependency");
                    Resolution::Unresolved(Unresolved::new(
                        request.clone(),
                        UnresolvedReason::Circular { stack },
                    ))
                }
                CircularPolicy::Null => {
                    warn!(
                        request = %request,
                        depth = self.depth(),
                        "circular dependency replaced with null"
                    );
                    Resolution::Resolved(Value::Null)
                }
            };
        }

        self.stack.push(request.clone());
        let config = self.config;
        let resolution = config.chain().resolve(request, self);
        self.stack.pop();
        resolution
    }
}
