use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;

use fixtura_core::{TypeRef, builtin_arity};

use crate::errors::{CatalogError, ValidationIssue, ValidationReport};
use crate::model::{CATALOG_VERSION, Catalog, ConstructorDecl, TypeDecl, TypeDeclKind};
use crate::schema::catalog_json_schema_value;

/// Catalog that passed validation, with the warnings it produced.
#[derive(Debug, Clone)]
pub struct ValidatedCatalog {
    pub catalog: Catalog,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a catalog document against the catalog JSON Schema.
pub fn validate_catalog_json(
    catalog_json: &Value,
    catalog_schema: &Value,
) -> Result<ValidationReport, CatalogError> {
    let compiled = JSONSchema::compile(catalog_schema)
        .map_err(|err| CatalogError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(catalog_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
            ));
        }
    }

    Ok(report)
}

/// Check the declarations of a parsed catalog against each other.
pub fn validate_catalog(catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport::default();

    if catalog.version != CATALOG_VERSION {
        report.push(
            ValidationIssue::error(
                "unsupported_version",
                "/version",
                format!("catalog version '{}' is not supported", catalog.version),
            )
            .with_hint(format!("set version to \"{CATALOG_VERSION}\"")),
        );
    }

    if let Some(options) = &catalog.options {
        if let Err(message) = options.validate() {
            report.push(ValidationIssue::error("invalid_options", "/options", message));
        }
    }

    let index = build_type_index(catalog, &mut report);
    for (idx, decl) in catalog.types.iter().enumerate() {
        validate_decl(decl, &format!("/types/{idx}"), &index, &mut report);
    }

    report
}

/// Validate a catalog document end to end: schema first, then declarations.
pub fn validate_catalog_document(
    catalog_json: &Value,
) -> Result<ValidatedCatalog, ValidationReport> {
    let structural = match catalog_json_schema_value()
        .and_then(|schema| validate_catalog_json(catalog_json, &schema))
    {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let catalog: Catalog = match serde_json::from_value(catalog_json.clone()) {
        Ok(catalog) => catalog,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_catalog_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    let mut report = structural;
    report.merge(validate_catalog(&catalog));
    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedCatalog {
        catalog,
        warnings: report.warnings,
    })
}

/// Declared name to generic arity; the first declaration of a name wins.
fn build_type_index<'a>(
    catalog: &'a Catalog,
    report: &mut ValidationReport,
) -> HashMap<&'a str, usize> {
    let mut index = HashMap::new();
    for (idx, decl) in catalog.types.iter().enumerate() {
        if index.contains_key(decl.name.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_type",
                format!("/types/{idx}/name"),
                format!("type '{}' is declared more than once", decl.name),
            ));
            continue;
        }
        index.insert(decl.name.as_str(), decl.generics.len());
    }
    index
}

fn validate_decl(
    decl: &TypeDecl,
    base_path: &str,
    index: &HashMap<&str, usize>,
    report: &mut ValidationReport,
) {
    check_identifier(&decl.name, &format!("{base_path}/name"), report);
    if builtin_arity(&decl.name).is_some() {
        report.push(
            ValidationIssue::warning(
                "shadows_builtin",
                format!("{base_path}/name"),
                format!("type '{}' replaces the built-in of the same name", decl.name),
            )
            .with_hint("rename the type unless the replacement is intended"),
        );
    }

    let mut generics = HashSet::new();
    for (idx, generic) in decl.generics.iter().enumerate() {
        let path = format!("{base_path}/generics/{idx}");
        check_identifier(generic, &path, report);
        if generic == &decl.name {
            report.push(ValidationIssue::error(
                "generic_shadows_type",
                path,
                format!("generic parameter '{generic}' has the name of its type"),
            ));
        } else if !generics.insert(generic.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_generic",
                path,
                format!("generic parameter '{generic}' is declared twice"),
            ));
        }
    }

    let scope = TypeScope {
        generics: &decl.generics,
        index,
    };

    match decl.kind {
        TypeDeclKind::Enum => {
            validate_enum(decl, base_path, report);
            unused_field(!decl.constructors.is_empty(), base_path, "constructors", report);
            unused_field(!decl.implementations.is_empty(), base_path, "implementations", report);
        }
        TypeDeclKind::Object => {
            validate_object(decl, base_path, &scope, report);
            unused_field(!decl.values.is_empty(), base_path, "values", report);
            unused_field(!decl.implementations.is_empty(), base_path, "implementations", report);
        }
        TypeDeclKind::Abstract => {
            validate_abstract(decl, base_path, &scope, report);
            unused_field(!decl.values.is_empty(), base_path, "values", report);
            unused_field(!decl.constructors.is_empty(), base_path, "constructors", report);
        }
    }
}

fn validate_enum(decl: &TypeDecl, base_path: &str, report: &mut ValidationReport) {
    if decl.values.is_empty() {
        report.push(ValidationIssue::error(
            "empty_enum",
            format!("{base_path}/values"),
            format!("enum '{}' declares no values", decl.name),
        ));
        return;
    }
    let mut seen = HashSet::new();
    for (idx, value) in decl.values.iter().enumerate() {
        if !seen.insert(value.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_value",
                format!("{base_path}/values/{idx}"),
                format!("enum value '{value}' is declared twice"),
            ));
        }
    }
}

fn validate_object(
    decl: &TypeDecl,
    base_path: &str,
    scope: &TypeScope<'_>,
    report: &mut ValidationReport,
) {
    if decl.constructors.is_empty() {
        report.push(
            ValidationIssue::warning(
                "no_constructor",
                format!("{base_path}/constructors"),
                format!("object '{}' declares no constructor", decl.name),
            )
            .with_hint("requests for this type will be unresolved unless overridden"),
        );
        return;
    }

    let mut names = HashSet::new();
    for (idx, constructor) in decl.constructors.iter().enumerate() {
        let path = format!("{base_path}/constructors/{idx}");
        if !names.insert(constructor.name.as_str()) {
            report.push(ValidationIssue::warning(
                "duplicate_constructor",
                format!("{path}/name"),
                format!("constructor name '{}' is used twice", constructor.name),
            ));
        }
        validate_constructor(constructor, &path, scope, report);
    }

    let designated = decl
        .constructors
        .iter()
        .filter(|constructor| constructor.designated)
        .count();
    if designated > 1 {
        report.push(
            ValidationIssue::warning(
                "multiple_designated",
                format!("{base_path}/constructors"),
                format!("object '{}' has {designated} designated constructors", decl.name),
            )
            .with_hint("the first designated constructor in declaration order is tried first"),
        );
    }
}

fn validate_constructor(
    constructor: &ConstructorDecl,
    base_path: &str,
    scope: &TypeScope<'_>,
    report: &mut ValidationReport,
) {
    check_identifier(&constructor.name, &format!("{base_path}/name"), report);
    let mut params = HashSet::new();
    for (idx, param) in constructor.params.iter().enumerate() {
        let path = format!("{base_path}/params/{idx}");
        check_identifier(&param.name, &format!("{path}/name"), report);
        if !params.insert(param.name.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_parameter",
                format!("{path}/name"),
                format!(
                    "constructor '{}' declares parameter '{}' twice",
                    constructor.name, param.name
                ),
            ));
        }
        scope.check(&param.ty, &format!("{path}/type"), report);
    }
}

fn validate_abstract(
    decl: &TypeDecl,
    base_path: &str,
    scope: &TypeScope<'_>,
    report: &mut ValidationReport,
) {
    if decl.implementations.is_empty() {
        report.push(
            ValidationIssue::warning(
                "no_implementation",
                format!("{base_path}/implementations"),
                format!("abstract type '{}' lists no implementation", decl.name),
            )
            .with_hint("add implementations or map the type with a subtype override"),
        );
        return;
    }

    for (idx, implementation) in decl.implementations.iter().enumerate() {
        let path = format!("{base_path}/implementations/{idx}");
        let Some(ty) = scope.check(implementation, &path, report) else {
            continue;
        };
        if ty.name() == decl.name {
            report.push(ValidationIssue::error(
                "self_implementation",
                path,
                format!("abstract type '{}' lists itself as an implementation", decl.name),
            ));
        }
    }
}

fn unused_field(present: bool, base_path: &str, field: &str, report: &mut ValidationReport) {
    if present {
        report.push(ValidationIssue::warning(
            "unused_field",
            format!("{base_path}/{field}"),
            format!("'{field}' is ignored for this kind of type"),
        ));
    }
}

/// Names visible to the type expressions of one declaration.
struct TypeScope<'a> {
    generics: &'a [String],
    index: &'a HashMap<&'a str, usize>,
}

impl TypeScope<'_> {
    /// Report parse, unknown name and arity problems; returns the parsed
    /// expression when it parses.
    fn check(&self, expr: &str, path: &str, report: &mut ValidationReport) -> Option<TypeRef> {
        let ty = match TypeRef::parse(expr) {
            Ok(ty) => ty,
            Err(err) => {
                report.push(ValidationIssue::error(
                    "invalid_type_ref",
                    path,
                    err.to_string(),
                ));
                return None;
            }
        };

        for node in ty.walk() {
            let name = node.name();
            let given = node.args().len();
            let expected = if self.generics.iter().any(|generic| generic == name) {
                Some(0)
            } else {
                self.index.get(name).copied().or_else(|| builtin_arity(name))
            };
            match expected {
                None => report.push(
                    ValidationIssue::error(
                        "unknown_type",
                        path,
                        format!("type '{name}' is neither declared nor built in"),
                    )
                    .with_hint("declare it under `types` or use a built-in type"),
                ),
                Some(expected) if expected != given => report.push(ValidationIssue::error(
                    "arity_mismatch",
                    path,
                    format!("type '{name}' takes {expected} generic argument(s), got {given}"),
                )),
                Some(_) => {}
            }
        }
        Some(ty)
    }
}

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

fn check_identifier(name: &str, path: &str, report: &mut ValidationReport) {
    let valid = identifier_pattern().is_none_or(|pattern| pattern.is_match(name));
    if !valid {
        report.push(ValidationIssue::error(
            "invalid_identifier",
            path,
            format!("'{name}' is not a valid identifier"),
        ));
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
