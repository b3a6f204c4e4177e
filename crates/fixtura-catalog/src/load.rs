use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::errors::{CatalogError, Result};
use crate::validate::{ValidatedCatalog, validate_catalog_document};

/// Read a catalog file as a JSON document; `.toml` files are converted.
pub fn load_document(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Ok(serde_json::from_str(&contents)?),
        "toml" => Ok(toml::from_str(&contents)?),
        _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load and fully validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<ValidatedCatalog> {
    let document = load_document(path)?;
    validate_catalog_document(&document).map_err(CatalogError::Invalid)
}
