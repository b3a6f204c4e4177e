use std::fmt;

use fixtura_core::{TypeRef, Value};

/// Outcome of resolving one type request.
///
/// Resolution never fails by panicking or returning an error: a type that
/// cannot be built is reported as [`Resolution::Unresolved`] and only the
/// facade turns it into a [`FixtureError`](crate::FixtureError).
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Value),
    Unresolved(Unresolved),
}

impl Resolution {
    pub fn unresolved(request: &TypeRef, reason: UnresolvedReason) -> Self {
        Resolution::Unresolved(Unresolved::new(request.clone(), reason))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn into_result(self) -> Result<Value, Unresolved> {
        match self {
            Resolution::Resolved(value) => Ok(value),
            Resolution::Unresolved(unresolved) => Err(unresolved),
        }
    }
}

impl From<Result<Value, Unresolved>> for Resolution {
    fn from(result: Result<Value, Unresolved>) -> Self {
        match result {
            Ok(value) => Resolution::Resolved(value),
            Err(unresolved) => Resolution::Unresolved(unresolved),
        }
    }
}

/// Why a request could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// The type descriptor does not know the type.
    UnknownType,
    /// The type is known but no strategy claims its shape.
    NoStrategy,
    /// Every strategy that claimed the request failed.
    StrategiesFailed,
    /// The request is already being built further up the stack.
    Circular { stack: Vec<TypeRef> },
    DependencyFailed { dependency: TypeRef },
    ParameterFailed { constructor: String, parameter: String },
    ConstructorFailed { constructor: String, message: String },
    ConstructorsFailed,
    NoConstructor,
    NoImplementation,
    ImplementationsFailed,
    EmptyEnum,
    FactoryFailed { message: String },
    Unsatisfiable { message: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::UnknownType => write!(f, "unknown type"),
            UnresolvedReason::NoStrategy => write!(f, "no strategy handles this type"),
            UnresolvedReason::StrategiesFailed => write!(f, "all claiming strategies failed"),
            UnresolvedReason::Circular { stack } => {
                let path: Vec<String> = stack.iter().map(ToString::to_string).collect();
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            UnresolvedReason::DependencyFailed { dependency } => {
                write!(f, "dependency {dependency} unresolved")
            }
            UnresolvedReason::ParameterFailed {
                constructor,
                parameter,
            } => write!(
                f,
                "parameter '{parameter}' of constructor '{constructor}' unresolved"
            ),
            UnresolvedReason::ConstructorFailed {
                constructor,
                message,
            } => write!(f, "constructor '{constructor}' failed: {message}"),
            UnresolvedReason::ConstructorsFailed => write!(f, "no constructor could be invoked"),
            UnresolvedReason::NoConstructor => write!(f, "type declares no constructor"),
            UnresolvedReason::NoImplementation => write!(f, "abstract type has no implementation"),
            UnresolvedReason::ImplementationsFailed => {
                write!(f, "no implementation could be resolved")
            }
            UnresolvedReason::EmptyEnum => write!(f, "enum declares no values"),
            UnresolvedReason::FactoryFailed { message } => write!(f, "factory failed: {message}"),
            UnresolvedReason::Unsatisfiable { message } => write!(f, "unsatisfiable: {message}"),
        }
    }
}

/// A strategy that claimed a request and failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub strategy: &'static str,
    pub cause: Unresolved,
}

/// Diagnostic for an unresolved request, with the strategies that were tried
/// and any nested causes.
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved {
    pub request: TypeRef,
    pub reason: UnresolvedReason,
    pub attempts: Vec<Attempt>,
    pub causes: Vec<Unresolved>,
}

impl Unresolved {
    pub fn new(request: TypeRef, reason: UnresolvedReason) -> Self {
        Self {
            request,
            reason,
            attempts: Vec::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_attempts(mut self, attempts: Vec<Attempt>) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_cause(mut self, cause: Unresolved) -> Self {
        self.causes.push(cause);
        self
    }

    pub fn with_causes(mut self, causes: Vec<Unresolved>) -> Self {
        self.causes.extend(causes);
        self
    }

    /// `request` failed because `dependency` failed with `cause`.
    pub fn dependency(request: &TypeRef, dependency: &TypeRef, cause: Unresolved) -> Self {
        Self::new(
            request.clone(),
            UnresolvedReason::DependencyFailed {
                dependency: dependency.clone(),
            },
        )
        .with_cause(cause)
    }

    /// Ids of the strategies tried for this request, in order.
    pub fn attempted_strategies(&self) -> Vec<&'static str> {
        self.attempts.iter().map(|attempt| attempt.strategy).collect()
    }

    /// This diagnostic and every nested one, depth first.
    pub fn walk(&self) -> Vec<&Unresolved> {
        let mut out = vec![self];
        for attempt in &self.attempts {
            out.extend(attempt.cause.walk());
        }
        for cause in &self.causes {
            out.extend(cause.walk());
        }
        out
    }

    pub fn is_circular(&self) -> bool {
        self.walk()
            .iter()
            .any(|node| matches!(node.reason, UnresolvedReason::Circular { .. }))
    }

    fn write_trail(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(f, "{indent}{}: {}", self.request, self.reason)?;
        for attempt in &self.attempts {
            writeln!(f, "{indent}  - tried {}", attempt.strategy)?;
            attempt.cause.write_trail(f, depth + 2)?;
        }
        for cause in &self.causes {
            cause.write_trail(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_trail(f, 0)
    }
}
