use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::value::Value;

/// A request for a concrete type, including its resolved generic arguments.
///
/// `List<string>` and `List<i32>` are different requests. The textual form
/// `Name<Arg, Arg>` round-trips through [`FromStr`] and [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    name: String,
    args: Vec<TypeRef>,
}

impl TypeRef {
    /// A type without generic arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A type applied to generic arguments.
    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn list(element: TypeRef) -> Self {
        Self::generic("List", [element])
    }

    pub fn set(element: TypeRef) -> Self {
        Self::generic("Set", [element])
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::generic("Map", [key, value])
    }

    pub fn option(inner: TypeRef) -> Self {
        Self::generic("Option", [inner])
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = TypeParser { input, pos: 0 };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(parsed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[TypeRef] {
        &self.args
    }

    /// Replace generic parameters with concrete arguments.
    ///
    /// Only bare names (no arguments of their own) are treated as parameters.
    pub fn substitute(&self, bindings: &HashMap<&str, &TypeRef>) -> TypeRef {
        if self.args.is_empty() {
            if let Some(bound) = bindings.get(self.name.as_str()) {
                return (*bound).clone();
            }
        }
        TypeRef {
            name: self.name.clone(),
            args: self.args.iter().map(|arg| arg.substitute(bindings)).collect(),
        }
    }

    /// Visit this reference and every nested argument, outermost first.
    pub fn walk(&self) -> Vec<&TypeRef> {
        let mut out = vec![self];
        for arg in &self.args {
            out.extend(arg.walk());
        }
        out
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TypeRef::parse(&raw).map_err(serde::de::Error::custom)
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_ws();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | ':') {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let name = self.input[start..self.pos].to_string();

        self.skip_ws();
        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.bump();
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.bump() {
                    Some(',') => continue,
                    Some('>') => break,
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        Ok(TypeRef { name, args })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::InvalidType {
            input: self.input.to_string(),
            message: format!("{message} at offset {}", self.pos),
        }
    }
}

/// Fixed-size scalar kinds produced directly from the random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Uuid,
    Date,
    DateTime,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::Bool,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Char,
        PrimitiveKind::String,
        PrimitiveKind::Uuid,
        PrimitiveKind::Date,
        PrimitiveKind::DateTime,
    ];

    /// Canonical type name.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Char => "char",
            PrimitiveKind::String => "string",
            PrimitiveKind::Uuid => "uuid",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "datetime",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "Boolean" => PrimitiveKind::Bool,
            "i8" | "Byte" => PrimitiveKind::I8,
            "i16" | "Short" => PrimitiveKind::I16,
            "i32" | "Int" => PrimitiveKind::I32,
            "i64" | "Long" => PrimitiveKind::I64,
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "f32" | "Float" => PrimitiveKind::F32,
            "f64" | "Double" => PrimitiveKind::F64,
            "char" | "Char" => PrimitiveKind::Char,
            "string" | "String" => PrimitiveKind::String,
            "uuid" | "Uuid" => PrimitiveKind::Uuid,
            "date" | "Date" => PrimitiveKind::Date,
            "datetime" | "DateTime" => PrimitiveKind::DateTime,
            _ => return None,
        };
        Some(kind)
    }

    /// Inclusive integer bounds, `None` for non-integer kinds.
    pub fn int_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            PrimitiveKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            PrimitiveKind::U8 => (0, u8::MAX as i128),
            PrimitiveKind::U16 => (0, u16::MAX as i128),
            PrimitiveKind::U32 => (0, u32::MAX as i128),
            PrimitiveKind::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 | PrimitiveKind::U64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the final value of a constructor from its resolved arguments.
pub type ConstructorFn =
    Arc<dyn Fn(&[(String, Value)]) -> std::result::Result<Value, String> + Send + Sync>;

/// A named constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One constructible signature of an object type.
#[derive(Clone)]
pub struct Constructor {
    pub name: String,
    pub params: Vec<Parameter>,
    /// Preferred over every other constructor of the same type.
    pub designated: bool,
    /// Without a build function the value is a [`Value::Object`] of the parameters.
    pub build: Option<ConstructorFn>,
}

impl Constructor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            designated: false,
            build: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Parameter::new(name, ty));
        self
    }

    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }

    pub fn with_build<F>(mut self, build: F) -> Self
    where
        F: Fn(&[(String, Value)]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.build = Some(Arc::new(build));
        self
    }

    pub fn substitute(&self, bindings: &HashMap<&str, &TypeRef>) -> Constructor {
        Constructor {
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|param| Parameter::new(param.name.clone(), param.ty.substitute(bindings)))
                .collect(),
            designated: self.designated,
            build: self.build.clone(),
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("designated", &self.designated)
            .field("build", &self.build.is_some())
            .finish()
    }
}

/// How a type can be constructed, as reported by a
/// [`TypeDescriptor`](crate::registry::TypeDescriptor).
#[derive(Debug, Clone)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    /// Closed set of named constants.
    Enum(Vec<String>),
    /// Value that may be absent.
    Optional(TypeRef),
    Sequence(TypeRef),
    Set(TypeRef),
    Map(TypeRef, TypeRef),
    Object(Vec<Constructor>),
    /// Interface or sealed type with its known implementations.
    Abstract(Vec<TypeRef>),
}
