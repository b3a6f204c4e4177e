//! Fixture generation engine for Fixtura.
//!
//! Requests are resolved by an ordered chain of strategies. Each strategy
//! either declines a request or builds it, recursing through a per-call
//! resolution context that also guards against cyclic type graphs.

pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod fixture;
pub mod model;
pub mod resolution;
pub mod strategies;

pub use config::{Configuration, ConfigurationBuilder, Factory};
pub use context::ResolutionContext;
pub use engine::ResolverChain;
pub use errors::{FixtureError, Result};
pub use fixture::{Fixture, FixtureIter, FixtureSequence, fixture, fixture_with};
pub use model::{CircularPolicy, GenerateOptions};
pub use resolution::{Attempt, Resolution, Unresolved, UnresolvedReason};
pub use strategies::{FnStrategy, Strategy, from_fn};
