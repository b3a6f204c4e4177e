use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Constructor, PrimitiveKind, TypeRef, TypeShape};

/// Capability that tells the engine how a type can be built.
///
/// Returns `None` when the type is unknown or applied to the wrong number of
/// generic arguments.
pub trait TypeDescriptor: Send + Sync {
    fn describe(&self, ty: &TypeRef) -> Option<TypeShape>;
}

impl<T: TypeDescriptor + ?Sized> TypeDescriptor for Arc<T> {
    fn describe(&self, ty: &TypeRef) -> Option<TypeShape> {
        (**self).describe(ty)
    }
}

/// Body of a user-declared type.
#[derive(Debug, Clone)]
pub enum TypeDefKind {
    Enum(Vec<String>),
    Object(Vec<Constructor>),
    Abstract(Vec<TypeRef>),
}

/// A user-declared type, possibly generic over named parameters.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub generics: Vec<String>,
    pub kind: TypeDefKind,
}

impl TypeDef {
    pub fn enumeration<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            generics: Vec::new(),
            kind: TypeDefKind::Enum(labels.into_iter().map(Into::into).collect()),
        }
    }

    pub fn object(name: impl Into<String>, constructors: Vec<Constructor>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
            kind: TypeDefKind::Object(constructors),
        }
    }

    pub fn abstract_type(name: impl Into<String>, implementations: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
            kind: TypeDefKind::Abstract(implementations),
        }
    }

    pub fn with_generics<I, S>(mut self, generics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generics = generics.into_iter().map(Into::into).collect();
        self
    }

    fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for generic in &self.generics {
            if generic == &self.name {
                return Err(self.invalid(format!(
                    "generic parameter '{generic}' shadows the type name"
                )));
            }
            if !seen.insert(generic.as_str()) {
                return Err(self.invalid(format!("duplicate generic parameter '{generic}'")));
            }
        }
        if let TypeDefKind::Object(constructors) = &self.kind {
            for constructor in constructors {
                let mut params = HashSet::new();
                for param in &constructor.params {
                    if !params.insert(param.name.as_str()) {
                        return Err(self.invalid(format!(
                            "constructor '{}' declares parameter '{}' twice",
                            constructor.name, param.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> Error {
        Error::InvalidDefinition {
            name: self.name.clone(),
            message,
        }
    }
}

/// Explicit registry of constructible types.
///
/// Built-in primitives and containers are always known; user types are added
/// with [`TypeRegistry::register`]. A registered name takes precedence over a
/// built-in with the same name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, returning the definition it replaced.
    pub fn register(&mut self, def: TypeDef) -> Result<Option<TypeDef>> {
        def.check()?;
        Ok(self.types.insert(def.name.clone(), def))
    }

    pub fn with(mut self, def: TypeDef) -> Result<Self> {
        self.register(def)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeDescriptor for TypeRegistry {
    fn describe(&self, ty: &TypeRef) -> Option<TypeShape> {
        let Some(def) = self.types.get(ty.name()) else {
            return builtin_shape(ty);
        };
        if def.generics.len() != ty.args().len() {
            return None;
        }
        let bindings: HashMap<&str, &TypeRef> = def
            .generics
            .iter()
            .map(String::as_str)
            .zip(ty.args())
            .collect();

        let shape = match &def.kind {
            TypeDefKind::Enum(labels) => TypeShape::Enum(labels.clone()),
            TypeDefKind::Object(constructors) => TypeShape::Object(
                constructors
                    .iter()
                    .map(|constructor| constructor.substitute(&bindings))
                    .collect(),
            ),
            TypeDefKind::Abstract(implementations) => TypeShape::Abstract(
                implementations
                    .iter()
                    .map(|implementation| implementation.substitute(&bindings))
                    .collect(),
            ),
        };
        Some(shape)
    }
}

/// Shape of a built-in primitive or container, if `ty` names one.
pub fn builtin_shape(ty: &TypeRef) -> Option<TypeShape> {
    let shape = match (ty.name(), ty.args()) {
        ("Option" | "Optional", [inner]) => TypeShape::Optional(inner.clone()),
        ("List" | "Vec" | "Sequence", [element]) => TypeShape::Sequence(element.clone()),
        ("Set", [element]) => TypeShape::Set(element.clone()),
        ("Map", [key, value]) => TypeShape::Map(key.clone(), value.clone()),
        (name, []) => TypeShape::Primitive(PrimitiveKind::from_name(name)?),
        _ => return None,
    };
    Some(shape)
}

/// Number of generic arguments a built-in name expects.
pub fn builtin_arity(name: &str) -> Option<usize> {
    match name {
        "Option" | "Optional" | "List" | "Vec" | "Sequence" | "Set" => Some(1),
        "Map" => Some(2),
        _ => PrimitiveKind::from_name(name).map(|_| 0),
    }
}
