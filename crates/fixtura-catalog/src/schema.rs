use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::errors::Result;
use crate::model::Catalog;

/// Emit the JSON Schema for catalog documents.
pub fn catalog_json_schema() -> RootSchema {
    schema_for!(Catalog)
}

/// The catalog JSON Schema as a JSON value, ready to compile.
pub fn catalog_json_schema_value() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(catalog_json_schema())?)
}
