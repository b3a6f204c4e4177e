use std::sync::Arc;

use rand::seq::IteratorRandom;
use serde::de::DeserializeOwned;
use tracing::debug;

use fixtura_core::{TypeRef, Value};

use crate::config::{Configuration, ConfigurationBuilder};
use crate::context::ResolutionContext;
use crate::errors::{FixtureError, Result};
use crate::resolution::Resolution;

/// Entry point for producing fixtures.
///
/// A `Fixture` is an immutable handle on a [`Configuration`]. Cloning is cheap
/// and clones may be used from any number of threads; every call owns its own
/// resolution state.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    configuration: Arc<Configuration>,
}

impl Fixture {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration: Arc::new(configuration),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Produce one random value of `request`.
    pub fn create(&self, request: &TypeRef) -> Result<Value> {
        create_in(&self.configuration, request)
    }

    /// Produce one value with overrides that apply to this call only.
    pub fn create_with<F>(&self, request: &TypeRef, overrides: F) -> Result<Value>
    where
        F: FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    {
        let configuration = self.layered(overrides)?;
        create_in(&configuration, request)
    }

    /// Produce one value and convert it through its JSON form.
    pub fn create_as<T: DeserializeOwned>(&self, request: &TypeRef) -> Result<T> {
        let value = self.create(request)?;
        Ok(serde_json::from_value(value.to_json())?)
    }

    /// Pick one element of `range` uniformly at random.
    ///
    /// The chain is bypassed entirely unless `range` is empty, in which case
    /// the value is generated as if by [`Fixture::create_as`].
    pub fn create_from<T, I>(&self, request: &TypeRef, range: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = T>,
    {
        match range.into_iter().choose(&mut rand::rng()) {
            Some(picked) => Ok(picked),
            None => self.create_as(request),
        }
    }

    /// Lazy, unbounded sequence of fresh values of `request`.
    pub fn create_many(&self, request: &TypeRef) -> FixtureSequence {
        FixtureSequence {
            configuration: Arc::clone(&self.configuration),
            request: request.clone(),
            limit: None,
        }
    }

    /// Like [`Fixture::create_many`], with overrides applied to every element.
    pub fn create_many_with<F>(&self, request: &TypeRef, overrides: F) -> Result<FixtureSequence>
    where
        F: FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    {
        Ok(FixtureSequence {
            configuration: Arc::new(self.layered(overrides)?),
            request: request.clone(),
            limit: None,
        })
    }

    /// New fixture whose configuration layers `overrides` over this one.
    pub fn with_overrides<F>(&self, overrides: F) -> Result<Fixture>
    where
        F: FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    {
        Ok(Fixture::new(self.layered(overrides)?))
    }

    fn layered<F>(&self, overrides: F) -> Result<Configuration>
    where
        F: FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    {
        overrides(ConfigurationBuilder::from(self.configuration.as_ref())).build()
    }
}

/// A fixture with the default configuration.
pub fn fixture() -> Fixture {
    Fixture::default()
}

/// A fixture configured by `configure` starting from the defaults.
pub fn fixture_with<F>(configure: F) -> Result<Fixture>
where
    F: FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
{
    Ok(Fixture::new(configure(ConfigurationBuilder::new()).build()?))
}

fn create_in(configuration: &Configuration, request: &TypeRef) -> Result<Value> {
    let mut rng = rand::rng();
    let mut ctx = ResolutionContext::new(configuration, &mut rng);
    match ctx.resolve(request) {
        Resolution::Resolved(value) => Ok(value),
        Resolution::Unresolved(unresolved) => {
            debug!(request = %request, reason = %unresolved.reason, "fixture creation failed");
            Err(FixtureError::Unresolved {
                request: request.clone(),
                unresolved: Box::new(unresolved),
            })
        }
    }
}

/// Restartable sequence of generated values.
///
/// Nothing is cached: each iteration resolves its elements afresh, so two
/// passes over the same sequence yield different values.
#[derive(Debug, Clone)]
pub struct FixtureSequence {
    configuration: Arc<Configuration>,
    request: TypeRef,
    limit: Option<usize>,
}

impl FixtureSequence {
    /// Stop every iteration after `count` elements.
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn request(&self) -> &TypeRef {
        &self.request
    }

    pub fn iter(&self) -> FixtureIter<'_> {
        FixtureIter {
            sequence: self,
            produced: 0,
        }
    }

    /// Iterate converting every element through its JSON form.
    pub fn iter_as<T: DeserializeOwned>(&self) -> impl Iterator<Item = Result<T>> + '_ {
        self.iter().map(|item| {
            let value = item?;
            Ok(serde_json::from_value(value.to_json())?)
        })
    }
}

impl<'a> IntoIterator for &'a FixtureSequence {
    type Item = Result<Value>;
    type IntoIter = FixtureIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct FixtureIter<'a> {
    sequence: &'a FixtureSequence,
    produced: usize,
}

impl Iterator for FixtureIter<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self
            .sequence
            .limit
            .is_some_and(|limit| self.produced >= limit)
        {
            return None;
        }
        self.produced += 1;
        Some(create_in(&self.sequence.configuration, &self.sequence.request))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.sequence.limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(self.produced);
                (remaining, Some(remaining))
            }
            None => (usize::MAX, None),
        }
    }
}
