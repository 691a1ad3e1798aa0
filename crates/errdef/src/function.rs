//! Callable values: plain function handles and manufactured exception types.
//!
//! The resolver never invokes a callable. A callable supplied as the
//! stack-start function only marks where trace capture should begin, so a
//! handle carries nothing but the name the stack capture matches frames by.

use std::fmt;

use crate::factory::ErrorType;

/// A named handle to a host function.
///
/// The name is matched against frame names when a trace is truncated at the
/// stack-start function, so it should be the function's path or its last
/// path segment (e.g. `handle_request` or `server::handle_request`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    name: String,
}

impl FunctionRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Creates a handle with no name. Anonymous handles never match a frame,
    /// so truncation at one falls back to the generic trace.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { name: String::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str("<anonymous>")
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A value accepted wherever a stack-start function is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Callable {
    Function(FunctionRef),
    /// Manufactured types are constructors, and constructors are callable.
    Type(ErrorType),
}

impl Callable {
    /// The name used to locate this callable's frame in a captured trace.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(function) => function.name(),
            Self::Type(error_type) => error_type.name(),
        }
    }
}

impl From<FunctionRef> for Callable {
    fn from(value: FunctionRef) -> Self {
        Self::Function(value)
    }
}

impl From<ErrorType> for Callable {
    fn from(value: ErrorType) -> Self {
        Self::Type(value)
    }
}
