use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use fixtura_core::{Constructor, TypeDef, TypeRef, TypeRegistry};
use fixtura_generate::{ConfigurationBuilder, GenerateOptions};

use crate::errors::Result;

/// Catalog format version understood by this crate.
pub const CATALOG_VERSION: &str = "0.1";

/// Declared type metadata, loaded from JSON or TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Catalog format version.
    pub version: String,
    /// Generation options applied to every fixture built from this catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
    /// Declared types. Built-in primitives and containers need no entry.
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// One declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    /// Names of generic parameters, bound positionally by each request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,
    pub kind: TypeDeclKind,
    /// Labels of an enum.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Constructors of an object.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorDecl>,
    /// Type expressions implementing an abstract type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TypeDeclKind {
    Enum,
    Object,
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConstructorDecl {
    #[serde(default = "default_constructor_name")]
    pub name: String,
    /// Tried before every other constructor of the type.
    #[serde(default)]
    pub designated: bool,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,
    /// Type expression, e.g. `List<Order>`.
    #[serde(rename = "type")]
    pub ty: String,
}

fn default_constructor_name() -> String {
    "new".to_string()
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            options: None,
            types: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|decl| decl.name == name)
    }

    /// Options declared by the catalog, or the defaults.
    pub fn generate_options(&self) -> GenerateOptions {
        self.options.clone().unwrap_or_default()
    }

    /// Registry holding every declared type.
    pub fn to_registry(&self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        for decl in &self.types {
            registry.register(decl.to_type_def()?)?;
        }
        Ok(registry)
    }

    /// Consume the catalog into its registry.
    pub fn into_registry(self) -> Result<TypeRegistry> {
        self.to_registry()
    }

    /// Configuration builder seeded with this catalog's types and options.
    pub fn configuration_builder(&self) -> Result<ConfigurationBuilder> {
        Ok(ConfigurationBuilder::new()
            .registry(self.to_registry()?)
            .options(self.generate_options()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDecl {
    pub fn to_type_def(&self) -> Result<TypeDef> {
        let def = match self.kind {
            TypeDeclKind::Enum => TypeDef::enumeration(self.name.clone(), self.values.clone()),
            TypeDeclKind::Object => {
                let constructors = self
                    .constructors
                    .iter()
                    .map(ConstructorDecl::to_constructor)
                    .collect::<Result<Vec<_>>>()?;
                TypeDef::object(self.name.clone(), constructors)
            }
            TypeDeclKind::Abstract => {
                let implementations = self
                    .implementations
                    .iter()
                    .map(|implementation| TypeRef::parse(implementation))
                    .collect::<fixtura_core::Result<Vec<_>>>()?;
                TypeDef::abstract_type(self.name.clone(), implementations)
            }
        };
        Ok(def.with_generics(self.generics.clone()))
    }
}

impl ConstructorDecl {
    fn to_constructor(&self) -> Result<Constructor> {
        let mut constructor = Constructor::new(self.name.clone());
        for param in &self.params {
            constructor = constructor.param(param.name.clone(), TypeRef::parse(&param.ty)?);
        }
        if self.designated {
            constructor = constructor.designated();
        }
        Ok(constructor)
    }
}
