use thiserror::Error;

use fixtura_core::TypeRef;

use crate::resolution::Unresolved;

/// Errors reported to callers of the fixture facade.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// No strategy could produce the requested type or one of its dependencies.
    #[error("unable to handle {request}\n{unresolved}")]
    Unresolved {
        request: TypeRef,
        unresolved: Box<Unresolved>,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("type error: {0}")]
    Type(#[from] fixtura_core::Error),
}

impl FixtureError {
    /// Diagnostic trail when the failure came from resolution.
    pub fn unresolved(&self) -> Option<&Unresolved> {
        match self {
            FixtureError::Unresolved { unresolved, .. } => Some(unresolved),
            _ => None,
        }
    }
}

/// Convenience alias for facade results.
pub type Result<T> = std::result::Result<T, FixtureError>;
