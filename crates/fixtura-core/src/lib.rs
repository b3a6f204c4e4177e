//! Core contracts for Fixtura.
//!
//! This crate defines type requests, the type descriptor capability with its
//! explicit registry, and the generated value tree shared by the engine, the
//! catalog loader and the CLI.

pub mod error;
pub mod registry;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use registry::{
    TypeDef, TypeDefKind, TypeDescriptor, TypeRegistry, builtin_arity, builtin_shape,
};
pub use types::{Constructor, ConstructorFn, Parameter, PrimitiveKind, TypeRef, TypeShape};
pub use value::Value;
