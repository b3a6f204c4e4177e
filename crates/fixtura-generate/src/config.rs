use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fixtura_core::{TypeDescriptor, TypeRef, TypeRegistry, Value};

use crate::context::ResolutionContext;
use crate::engine::ResolverChain;
use crate::errors::{FixtureError, Result};
use crate::model::{CircularPolicy, GenerateOptions};
use crate::strategies::{self, Strategy};

/// Produces a value for an overridden type or constructor parameter.
pub type Factory =
    Arc<dyn Fn(&mut ResolutionContext<'_>) -> std::result::Result<Value, String> + Send + Sync>;

/// Immutable, fully assembled resolution configuration.
///
/// Overrides never patch a configuration in place: they go through
/// [`ConfigurationBuilder::from`] and produce a new one.
#[derive(Clone)]
pub struct Configuration {
    chain: ResolverChain,
    strategies: Vec<Arc<dyn Strategy>>,
    factories: HashMap<TypeRef, Factory>,
    properties: HashMap<(String, String), Factory>,
    subtypes: HashMap<TypeRef, TypeRef>,
    descriptor: Arc<dyn TypeDescriptor>,
    options: GenerateOptions,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    pub fn chain(&self) -> &ResolverChain {
        &self.chain
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn descriptor(&self) -> &dyn TypeDescriptor {
        self.descriptor.as_ref()
    }

    /// Factory registered for exactly this type and generic arguments.
    pub fn factory(&self, ty: &TypeRef) -> Option<&Factory> {
        self.factories.get(ty)
    }

    /// Factory registered for a constructor parameter of `type_name`.
    pub fn property(&self, type_name: &str, parameter: &str) -> Option<&Factory> {
        self.properties
            .get(&(type_name.to_string(), parameter.to_string()))
    }

    pub fn subtype(&self, ty: &TypeRef) -> Option<&TypeRef> {
        self.subtypes.get(ty)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::new().assemble()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories: Vec<String> = self.factories.keys().map(ToString::to_string).collect();
        factories.sort();
        let mut properties: Vec<String> = self
            .properties
            .keys()
            .map(|(ty, param)| format!("{ty}.{param}"))
            .collect();
        properties.sort();
        f.debug_struct("Configuration")
            .field("chain", &self.chain)
            .field("factories", &factories)
            .field("properties", &properties)
            .field("subtypes", &self.subtypes)
            .field("options", &self.options)
            .finish()
    }
}

/// Assembles a [`Configuration`], optionally layered on an existing one.
#[derive(Clone)]
pub struct ConfigurationBuilder {
    strategies: Vec<Arc<dyn Strategy>>,
    inserted: usize,
    factories: HashMap<TypeRef, Factory>,
    properties: HashMap<(String, String), Factory>,
    subtypes: HashMap<TypeRef, TypeRef>,
    descriptor: Arc<dyn TypeDescriptor>,
    options: GenerateOptions,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            inserted: 0,
            factories: HashMap::new(),
            properties: HashMap::new(),
            subtypes: HashMap::new(),
            descriptor: Arc::new(TypeRegistry::new()),
            options: GenerateOptions::default(),
        }
    }
}

impl From<&Configuration> for ConfigurationBuilder {
    fn from(base: &Configuration) -> Self {
        Self {
            strategies: base.strategies.clone(),
            inserted: 0,
            factories: base.factories.clone(),
            properties: base.properties.clone(),
            subtypes: base.subtypes.clone(),
            descriptor: Arc::clone(&base.descriptor),
            options: base.options.clone(),
        }
    }
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor(mut self, descriptor: Arc<dyn TypeDescriptor>) -> Self {
        self.descriptor = descriptor;
        self
    }

    pub fn registry(self, registry: TypeRegistry) -> Self {
        self.descriptor(Arc::new(registry))
    }

    /// Add a user strategy.
    ///
    /// User strategies run after factory and subtype overrides but before the
    /// built-in strategies. Strategies added on top of an existing
    /// configuration run before the ones it already had.
    pub fn strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.insert(self.inserted, strategy);
        self.inserted += 1;
        self
    }

    /// Use `factory` for every request of exactly `ty`.
    pub fn factory<F>(self, ty: TypeRef, factory: F) -> Self
    where
        F: Fn(&mut ResolutionContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.try_factory(ty, move |ctx: &mut ResolutionContext<'_>| Ok(factory(ctx)))
    }

    pub fn try_factory<F>(mut self, ty: TypeRef, factory: F) -> Self
    where
        F: Fn(&mut ResolutionContext<'_>) -> std::result::Result<Value, String>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(ty, Arc::new(factory));
        self
    }

    /// Always produce `value` for `ty`.
    pub fn constant(self, ty: TypeRef, value: Value) -> Self {
        self.factory(ty, move |_ctx: &mut ResolutionContext<'_>| value.clone())
    }

    /// Use `factory` for the constructor parameter `parameter` of `type_name`.
    pub fn property<F>(
        mut self,
        type_name: impl Into<String>,
        parameter: impl Into<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&mut ResolutionContext<'_>) -> Value + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |ctx: &mut ResolutionContext<'_>| Ok(factory(ctx)));
        self.properties
            .insert((type_name.into(), parameter.into()), factory);
        self
    }

    pub fn property_value(
        self,
        type_name: impl Into<String>,
        parameter: impl Into<String>,
        value: Value,
    ) -> Self {
        self.property(type_name, parameter, move |_ctx: &mut ResolutionContext<'_>| {
            value.clone()
        })
    }

    /// Build `to` whenever `from` is requested.
    pub fn subtype(mut self, from: TypeRef, to: TypeRef) -> Self {
        self.subtypes.insert(from, to);
        self
    }

    /// Options as they stand so far.
    pub fn current_options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the size of every generated collection.
    pub fn repeat_count(self, count: usize) -> Self {
        self.collection_size(count, count)
    }

    pub fn collection_size(mut self, min: usize, max: usize) -> Self {
        self.options.collection_min = min;
        self.options.collection_max = max;
        self
    }

    pub fn string_length(mut self, min: usize, max: usize) -> Self {
        self.options.string_min_len = min;
        self.options.string_max_len = max;
        self
    }

    pub fn int_range(mut self, min: i64, max: i64) -> Self {
        self.options.int_min = Some(min);
        self.options.int_max = Some(max);
        self
    }

    pub fn float_range(mut self, min: f64, max: f64) -> Self {
        self.options.float_min = min;
        self.options.float_max = max;
        self
    }

    pub fn null_probability(mut self, probability: f64) -> Self {
        self.options.null_probability = probability;
        self
    }

    pub fn circular_policy(mut self, policy: CircularPolicy) -> Self {
        self.options.circular_policy = policy;
        self
    }

    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.options.recursion_limit = limit;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    pub fn build(self) -> Result<Configuration> {
        self.options.validate().map_err(FixtureError::InvalidConfig)?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Configuration {
        let mut chain = ResolverChain::new();
        strategies::register_leading(&mut chain);
        for strategy in &self.strategies {
            chain.push(Arc::clone(strategy));
        }
        strategies::register_builtin(&mut chain);

        Configuration {
            chain,
            strategies: self.strategies,
            factories: self.factories,
            properties: self.properties,
            subtypes: self.subtypes,
            descriptor: self.descriptor,
            options: self.options,
        }
    }
}
