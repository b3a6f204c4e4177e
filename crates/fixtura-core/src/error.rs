use thiserror::Error;

/// Core error type shared across Fixtura crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A textual type reference could not be parsed.
    #[error("invalid type reference '{input}': {message}")]
    InvalidType { input: String, message: String },
    /// A type definition violates registry invariants.
    #[error("invalid type definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },
}

/// Convenience alias for results returned by Fixtura crates.
pub type Result<T> = std::result::Result<T, Error>;
