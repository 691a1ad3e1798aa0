use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{
    args::ArgKind,
    exception::ExceptionInstance,
    factory::ErrorType,
    function::{Callable, FunctionRef},
};

/// Insertion-ordered string-keyed map used for options records and payload fields.
pub type Record = IndexMap<String, Object>;

/// Key used in JSON input and output to mark a function handle.
const FUNCTION_TAG: &str = "$function";
/// Key used in JSON output to mark a manufactured exception type.
const TYPE_TAG: &str = "$type";
/// Key used in JSON input and output to mark the undefined value.
const UNDEFINED_TAG: &str = "$undefined";

/// A loosely-typed value passed to a manufactured constructor.
///
/// Constructors accept any mix of these, so the resolver has to work out from
/// the argument kinds alone which call convention the caller used.
///
/// # JSON Serialization
///
/// `Object` serializes with natural mappings:
/// - `Null` ↔ JSON `null`
/// - `Bool` ↔ JSON `true`/`false`
/// - `Int` ↔ JSON integer
/// - `Float` ↔ JSON float
/// - `String` ↔ JSON string
/// - `List` ↔ JSON array
/// - `Record` ↔ JSON object
/// - `Function` ↔ `{"$function": "name"}`
/// - `Undefined` ↔ `{"$undefined": true}`
///
/// **Output-only:**
/// - `Type` → `{"$type": "Name"}`
/// - `Exception` → `{"name": ..., "message": ..., "stack": ..., <fields>}`
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// An explicitly absent value.
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Self>),
    /// A string-keyed record. Recognized as an options record when its keys
    /// line up with a type's declared properties.
    Record(Record),
    /// A named function handle, usable as a stack-start function.
    Function(FunctionRef),
    /// A manufactured exception type. Types are callable, so they count as
    /// callables during resolution.
    Type(ErrorType),
    /// A constructed exception instance.
    Exception(Box<ExceptionInstance>),
}

impl Object {
    /// Classifies this value for call-shape resolution.
    #[must_use]
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::String(_) => ArgKind::String,
            Self::Record(_) => ArgKind::Record,
            Self::Function(_) | Self::Type(_) => ArgKind::Callable,
            _ => ArgKind::Other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Converts the value into a callable if it is one, handing it back otherwise.
    pub fn into_callable(self) -> Result<Callable, Self> {
        match self {
            Self::Function(function) => Ok(Callable::Function(function)),
            Self::Type(error_type) => Ok(Callable::Type(error_type)),
            other => Err(other),
        }
    }

    /// Builds an object from parsed JSON.
    ///
    /// Objects with a single `$function` key become function handles and
    /// `{"$undefined": true}` becomes `Undefined`; every other JSON object
    /// becomes a record with its key order preserved.
    pub fn from_json(value: serde_json::Value) -> Result<Self, InvalidInputError> {
        use serde_json::Value as Json;

        Ok(match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    return Err(InvalidInputError::new(format!("unsupported number {n}")));
                }
            }
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect::<Result<_, _>>()?),
            Json::Object(map) => {
                if map.len() == 1 {
                    if let Some(tagged) = map.get(FUNCTION_TAG) {
                        let Some(name) = tagged.as_str() else {
                            return Err(InvalidInputError::new(format!("{FUNCTION_TAG} must name a function")));
                        };
                        return Ok(Self::Function(FunctionRef::new(name)));
                    }
                    if let Some(tagged) = map.get(UNDEFINED_TAG) {
                        if tagged.as_bool() == Some(true) {
                            return Ok(Self::Undefined);
                        }
                        return Err(InvalidInputError::new(format!("{UNDEFINED_TAG} must be true")));
                    }
                    if map.contains_key(TYPE_TAG) {
                        return Err(InvalidInputError::new(format!(
                            "{TYPE_TAG} values cannot be built from JSON"
                        )));
                    }
                }
                let mut record = Record::with_capacity(map.len());
                for (key, value) in map {
                    record.insert(key, Self::from_json(value)?);
                }
                Self::Record(record)
            }
        })
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(record) => {
                f.write_str("{")?;
                for (i, (key, value)) in record.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Function(function) => write!(f, "[function {}]", function.name()),
            Self::Type(error_type) => write!(f, "[type {}]", error_type.name()),
            Self::Exception(exc) => write!(f, "{exc}"),
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNDEFINED_TAG, &true)?;
                map.end()
            }
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(record) => record.serialize(serializer),
            Self::Function(function) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(FUNCTION_TAG, function.name())?;
                map.end()
            }
            Self::Type(error_type) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(TYPE_TAG, error_type.name())?;
                map.end()
            }
            Self::Exception(exc) => exc.serialize(serializer),
        }
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Record> for Object {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<FunctionRef> for Object {
    fn from(value: FunctionRef) -> Self {
        Self::Function(value)
    }
}

impl From<ErrorType> for Object {
    fn from(value: ErrorType) -> Self {
        Self::Type(value)
    }
}

impl From<Callable> for Object {
    fn from(value: Callable) -> Self {
        match value {
            Callable::Function(function) => Self::Function(function),
            Callable::Type(error_type) => Self::Type(error_type),
        }
    }
}

impl From<ExceptionInstance> for Object {
    fn from(value: ExceptionInstance) -> Self {
        Self::Exception(Box::new(value))
    }
}

/// Error returned when external input cannot be converted into an [`Object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInputError {
    message: String,
}

impl InvalidInputError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: {}", self.message)
    }
}

impl std::error::Error for InvalidInputError {}

/// Builds a [`Record`] from key/value pairs.
///
/// ```
/// use errdef::{Object, record};
///
/// let r = record! { "code" => 404, "path" => "/missing" };
/// assert_eq!(r.get("code"), Some(&Object::Int(404)));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(record.insert(::std::string::String::from($key), $crate::Object::from($value));)+
        record
    }};
}
