use std::fmt;

use crate::{args::ArgKind, object::InvalidInputError};

/// Result type alias for constructor invocations.
pub type ResolveResult<T> = Result<T, ResolutionError>;

/// Error raised while defining a new exception type.
///
/// Each variant names the configuration rule that was broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The type name was missing, empty or not a string.
    InvalidName,
    /// The options value was given but is not a record.
    OptionsNotRecord,
    /// The options record was given but holds no keys.
    EmptyOptions,
    /// The options record holds a key other than `parent`, `props` or `defaultMsg`.
    UnknownOption(String),
    /// `parent` is neither an exception type nor an exception instance.
    InvalidParent,
    /// `defaultMsg` is present but empty or not a string.
    InvalidDefaultMessage,
    /// `props` is not a list.
    PropsNotList,
    /// `props` is an empty list.
    EmptyProps,
    /// A property name is empty or not a string.
    InvalidPropertyName { index: usize },
    /// The same property name was declared twice.
    DuplicatePropertyName(String),
    /// A property name collides with `message`, `stack` or `stackStartFunction`.
    ReservedPropertyName(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => f.write_str("name must be a non-empty string"),
            Self::OptionsNotRecord => f.write_str("options must be a record"),
            Self::EmptyOptions => f.write_str("options must be a non-empty record"),
            Self::UnknownOption(key) => write!(f, "unknown option \"{key}\""),
            Self::InvalidParent => f.write_str("parent must be an exception type or an instance of one"),
            Self::InvalidDefaultMessage => f.write_str("defaultMsg, if present, must be a non-empty string"),
            Self::PropsNotList => f.write_str("props must be a list"),
            Self::EmptyProps => f.write_str("properties list must be a non-empty list"),
            Self::InvalidPropertyName { index } => {
                write!(f, "each property name in props must be a non-empty string (index {index})")
            }
            Self::DuplicatePropertyName(name) => write!(f, "property \"{name}\" is declared more than once"),
            Self::ReservedPropertyName(name) => write!(f, "\"{name}\" is a reserved property name"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised when constructor arguments match no supported call shape.
///
/// Each variant identifies which call-shape expectation was violated, so the
/// call site can be fixed without reading the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A lone argument to a type without properties was neither a string nor callable.
    InvalidSingleArgument { kind: ArgKind },
    /// The argument in message position was not a string.
    MessageNotString { kind: ArgKind },
    /// The argument in stack-start position was not callable.
    StackStartNotCallable { kind: ArgKind },
    TooManyArguments { max: usize, got: usize },
    /// A message was passed positionally and inside the options record.
    RedundantMessage,
    /// A stack-start function was passed positionally and inside the options record.
    RedundantStackStartFunction,
    /// One argument beyond the declared properties was neither a leading
    /// string nor a trailing callable.
    InvalidExtraArgument,
    /// Two arguments beyond the declared properties were not a leading string
    /// and a trailing callable.
    InvalidExtraArguments,
    /// Fewer arguments than declared properties were supplied.
    MissingProperties { required: Vec<String>, got: usize },
    /// No arguments were supplied to a type with declared properties.
    MissingArguments { required: Vec<String> },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSingleArgument { kind } => {
                write!(f, "argument must be a message or stack-start function, got {kind}")
            }
            Self::MessageNotString { kind } => write!(f, "message must be a string, got {kind}"),
            Self::StackStartNotCallable { kind } => {
                write!(f, "stack-start function must be a function, got {kind}")
            }
            Self::TooManyArguments { max, got } => {
                write!(f, "too many arguments: expected at most {max}, got {got}")
            }
            Self::RedundantMessage => f.write_str("redundant message argument"),
            Self::RedundantStackStartFunction => f.write_str("redundant stack-start-function argument"),
            Self::InvalidExtraArgument => f.write_str("invalid type of message or stack-start-function argument"),
            Self::InvalidExtraArguments => {
                f.write_str("invalid type of message and stack-start-function arguments")
            }
            Self::MissingProperties { required, got } => write!(
                f,
                "missing required properties: expected {} ({}), got {got}",
                required.len(),
                required.join(", ")
            ),
            Self::MissingArguments { required } => {
                write!(f, "missing required arguments: properties {}", required.join(", "))
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

/// Any failure this crate can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Config(ConfigError),
    Resolution(ResolutionError),
    InvalidInput(InvalidInputError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "configuration error: {error}"),
            Self::Resolution(error) => write!(f, "{error}"),
            Self::InvalidInput(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::Resolution(error) => Some(error),
            Self::InvalidInput(error) => Some(error),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<ResolutionError> for Error {
    fn from(error: ResolutionError) -> Self {
        Self::Resolution(error)
    }
}

impl From<InvalidInputError> for Error {
    fn from(error: InvalidInputError) -> Self {
        Self::InvalidInput(error)
    }
}
