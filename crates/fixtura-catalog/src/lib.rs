//! Declared type catalogs for Fixtura.
//!
//! A catalog lists enums, objects and abstract types in JSON or TOML. It is
//! checked against its JSON Schema and for consistency between declarations
//! before being turned into a type registry for the generation engine.

pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{CatalogError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use load::{load_catalog, load_document};
pub use model::{
    CATALOG_VERSION, Catalog, ConstructorDecl, ParamDecl, TypeDecl, TypeDeclKind,
};
pub use schema::{catalog_json_schema, catalog_json_schema_value};
pub use validate::{
    ValidatedCatalog, validate_catalog, validate_catalog_document, validate_catalog_json,
};
