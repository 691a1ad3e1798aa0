use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{
    factory::{ErrorType, header_line},
    object::{Object, Record},
};

/// An exception produced by a manufactured constructor.
///
/// Carries the type's name, the resolved message, the captured trace and one
/// field per declared property. Every instance implements
/// [`std::error::Error`], and [`is_instance_of`](Self::is_instance_of) answers
/// "is-a" for its own type and each of its ancestors.
///
/// Two instances compare equal when their type, message and payload match;
/// the trace is not compared.
#[derive(Debug, Clone)]
pub struct ExceptionInstance {
    error_type: ErrorType,
    message: String,
    stack: String,
    fields: Record,
}

impl ExceptionInstance {
    pub(crate) fn new(error_type: ErrorType, message: String, stack: String, fields: Record) -> Self {
        Self {
            error_type,
            message,
            stack,
            fields,
        }
    }

    /// The declared name of the instance's type.
    #[must_use]
    pub fn name(&self) -> &str {
        self.error_type.name()
    }

    /// The message, or `""` when none was given and the type has no default.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The trace captured at construction. Never empty.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Looks up a payload field by its declared name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Object> {
        self.fields.get(field)
    }

    /// The payload fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    #[must_use]
    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    /// Returns true if this instance's type is `error_type` or inherits from it.
    #[must_use]
    pub fn is_instance_of(&self, error_type: &ErrorType) -> bool {
        self.error_type.is_subtype_of(error_type)
    }
}

impl PartialEq for ExceptionInstance {
    fn eq(&self, other: &Self) -> bool {
        self.error_type == other.error_type && self.message == other.message && self.fields == other.fields
    }
}

impl fmt::Display for ExceptionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&header_line(self.name(), &self.message))
    }
}

impl std::error::Error for ExceptionInstance {}

impl Serialize for ExceptionInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.fields.len()))?;
        map.serialize_entry("name", self.name())?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry("stack", &self.stack)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
