//! The exception type factory.
//!
//! [`Factory::define`] validates a type configuration and returns an
//! [`ErrorType`]: the constructor for that exception type. Constructors hand
//! their arguments to the resolver and build an [`ExceptionInstance`] from the
//! resolved options.
//!
//! # Inheritance
//!
//! A type records its parent type explicitly. "Is-a" checks walk the parent
//! chain ([`ErrorType::ancestors`]) instead of consulting shared prototype
//! objects, and every instance is a [`std::error::Error`] whatever its chain.

use std::{fmt, sync::Arc};

use ahash::AHashSet;

use crate::{
    args::{MESSAGE_KEY, STACK_START_KEY},
    error::{ConfigError, ResolveResult},
    exception::ExceptionInstance,
    object::Object,
    resolve::{ResolvedOptions, resolve_traced},
    stack::{BacktraceCapture, StackCapture, StackStart},
    tracer::{FactoryTracer, NoopTracer},
};

/// Property names that can never be declared as payload fields.
pub const RESERVED_PROPERTY_NAMES: [&str; 3] = [MESSAGE_KEY, "stack", STACK_START_KEY];

/// Option keys accepted by [`Factory::define_object`].
const PARENT_OPTION: &str = "parent";
const PROPS_OPTION: &str = "props";
const DEFAULT_MESSAGE_OPTION: &str = "defaultMsg";

/// Optional configuration of a new exception type.
///
/// ```
/// use errdef::{DefineOptions, define};
///
/// let http = define("HttpError", None).unwrap();
/// let not_found = define(
///     "NotFound",
///     Some(
///         DefineOptions::new()
///             .with_parent(http.clone())
///             .with_props(["path"])
///             .with_default_message("not found"),
///     ),
/// )
/// .unwrap();
/// assert!(not_found.is_subtype_of(&http));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefineOptions {
    parent: Option<ErrorType>,
    props: Option<Vec<String>>,
    default_message: Option<String>,
}

impl DefineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type the new type inherits from.
    #[must_use]
    pub fn with_parent(mut self, parent: ErrorType) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Inherits from the type of an existing instance.
    #[must_use]
    pub fn with_parent_instance(mut self, instance: &ExceptionInstance) -> Self {
        self.parent = Some(instance.error_type().clone());
        self
    }

    /// Declares the required payload properties, in positional order.
    #[must_use]
    pub fn with_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the message used when a constructor call supplies none.
    #[must_use]
    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.parent.is_none() && self.props.is_none() && self.default_message.is_none()
    }
}

/// Immutable configuration of one manufactured type.
struct TypeSpec {
    name: String,
    parent: Option<ErrorType>,
    props: Option<Vec<String>>,
    default_message: Option<String>,
    capture: Arc<dyn StackCapture>,
}

/// A manufactured exception type, callable as a constructor.
///
/// Cloning is cheap and all clones refer to the same type: equality is
/// identity, so two separately defined types with the same name are distinct.
#[derive(Clone)]
pub struct ErrorType(Arc<TypeSpec>);

impl ErrorType {
    /// The declared type name, also used as the `name` of every instance.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.0.parent.as_ref()
    }

    /// The declared payload properties, in positional order.
    #[must_use]
    pub fn props(&self) -> Option<&[String]> {
        self.0.props.as_deref()
    }

    #[must_use]
    pub fn default_message(&self) -> Option<&str> {
        self.0.default_message.as_deref()
    }

    /// Iterates over this type and then each of its ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |current| current.parent())
    }

    /// Returns true if `self` is `other` or inherits from it.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Self) -> bool {
        self.ancestors().any(|ancestor| ancestor == other)
    }

    /// Invokes the constructor as a plain call.
    ///
    /// Plain calls construct exactly as [`construct`](Self::construct) does,
    /// so callers never need to care which form they use.
    pub fn call(&self, args: Vec<Object>) -> ResolveResult<ExceptionInstance> {
        self.call_traced(args, &mut NoopTracer)
    }

    pub fn call_traced(&self, args: Vec<Object>, tracer: &mut impl FactoryTracer) -> ResolveResult<ExceptionInstance> {
        self.construct_traced(args, tracer)
    }

    /// Constructs a new instance from loosely-typed arguments.
    ///
    /// Fails without producing an instance when the arguments match no
    /// supported call shape.
    pub fn construct(&self, args: Vec<Object>) -> ResolveResult<ExceptionInstance> {
        self.construct_traced(args, &mut NoopTracer)
    }

    pub fn construct_traced(
        &self,
        args: Vec<Object>,
        tracer: &mut impl FactoryTracer,
    ) -> ResolveResult<ExceptionInstance> {
        let resolved = match resolve_traced(args, self.props(), self.default_message(), tracer) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracer.on_resolution_failed(self.name(), &error);
                return Err(error);
            }
        };
        let ResolvedOptions {
            message,
            stack_start_function,
            fields,
            ..
        } = resolved;

        let message = message.unwrap_or_default();
        let header = header_line(self.name(), &message);
        let start = match &stack_start_function {
            Some(callable) => StackStart::Function(callable.name()),
            None => StackStart::Constructor(self.name()),
        };
        let stack = self.0.capture.capture(&header, start);

        tracer.on_instance_created(self.name(), fields.len());
        Ok(ExceptionInstance::new(self.clone(), message, stack, fields))
    }
}

/// Renders the first line of a trace the way `Display` renders the instance.
pub(crate) fn header_line(name: &str, message: &str) -> String {
    if message.is_empty() {
        name.to_owned()
    } else {
        format!("{name}: {message}")
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ErrorType {}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorType")
            .field("name", &self.0.name)
            .field("parent", &self.parent().map(Self::name))
            .field("props", &self.0.props)
            .field("default_message", &self.0.default_message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces exception types that share one set of environment collaborators.
///
/// The default factory captures native backtraces; hosts with their own call
/// stack supply a different [`StackCapture`].
#[derive(Debug, Clone)]
pub struct Factory {
    capture: Arc<dyn StackCapture>,
}

impl Default for Factory {
    fn default() -> Self {
        Self {
            capture: Arc::new(BacktraceCapture),
        }
    }
}

impl Factory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stack capture used by types this factory defines.
    #[must_use]
    pub fn with_stack_capture(mut self, capture: impl StackCapture + 'static) -> Self {
        self.capture = Arc::new(capture);
        self
    }

    /// Defines a new exception type.
    ///
    /// `options`, when given, must set at least one option.
    pub fn define(&self, name: &str, options: Option<DefineOptions>) -> Result<ErrorType, ConfigError> {
        self.define_traced(name, options, &mut NoopTracer)
    }

    pub fn define_traced(
        &self,
        name: &str,
        options: Option<DefineOptions>,
        tracer: &mut impl FactoryTracer,
    ) -> Result<ErrorType, ConfigError> {
        let checked = check_name(name).and_then(|()| match options {
            Some(options) if options.is_empty() => Err(ConfigError::EmptyOptions),
            Some(options) => check_options(options),
            None => Ok(DefineOptions::default()),
        });
        match checked {
            Ok(options) => Ok(self.build(name, options, tracer)),
            Err(error) => {
                tracer.on_config_rejected(&error);
                Err(error)
            }
        }
    }

    /// Defines a new exception type from loosely-typed configuration.
    ///
    /// `name` must be a non-empty string. `options`, when given, must be a
    /// non-empty record whose keys are drawn from `parent` (an exception type or
    /// an instance of one), `props` (a list of property names) and `defaultMsg`
    /// (a non-empty string). `Undefined` or `Null` options count as absent.
    pub fn define_object(&self, name: &Object, options: Option<&Object>) -> Result<ErrorType, ConfigError> {
        self.define_object_traced(name, options, &mut NoopTracer)
    }

    pub fn define_object_traced(
        &self,
        name: &Object,
        options: Option<&Object>,
        tracer: &mut impl FactoryTracer,
    ) -> Result<ErrorType, ConfigError> {
        let converted = match name {
            Object::String(name) => options
                .filter(|options| !matches!(options, Object::Undefined | Object::Null))
                .map(options_from_object)
                .transpose()
                .map(|options| (name.as_str(), options)),
            _ => Err(ConfigError::InvalidName),
        };
        match converted {
            Ok((name, options)) => self.define_traced(name, options, tracer),
            Err(error) => {
                tracer.on_config_rejected(&error);
                Err(error)
            }
        }
    }

    fn build(&self, name: &str, options: DefineOptions, tracer: &mut impl FactoryTracer) -> ErrorType {
        let DefineOptions {
            parent,
            props,
            default_message,
        } = options;
        tracer.on_type_defined(name, parent.as_ref().map(ErrorType::name), props.as_deref());
        ErrorType(Arc::new(TypeSpec {
            name: name.to_owned(),
            parent,
            props,
            default_message,
            capture: Arc::clone(&self.capture),
        }))
    }
}

/// Defines a new exception type with the default [`Factory`].
pub fn define(name: &str, options: Option<DefineOptions>) -> Result<ErrorType, ConfigError> {
    Factory::default().define(name, options)
}

/// Defines a new exception type from loosely-typed configuration with the
/// default [`Factory`].
pub fn define_object(name: &Object, options: Option<&Object>) -> Result<ErrorType, ConfigError> {
    Factory::default().define_object(name, options)
}

fn check_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        Err(ConfigError::InvalidName)
    } else {
        Ok(())
    }
}

fn check_options(options: DefineOptions) -> Result<DefineOptions, ConfigError> {
    if options.default_message.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::InvalidDefaultMessage);
    }
    if let Some(props) = &options.props {
        check_props(props.iter().map(|prop| Some(prop.as_str())))?;
    }
    Ok(options)
}

/// Validates property names, reporting the first offending entry.
///
/// `None` stands for an entry that is not a string at all.
fn check_props<'a>(props: impl ExactSizeIterator<Item = Option<&'a str>>) -> Result<(), ConfigError> {
    if props.len() == 0 {
        return Err(ConfigError::EmptyProps);
    }
    let mut seen = AHashSet::with_capacity(props.len());
    for (index, prop) in props.enumerate() {
        let Some(prop) = prop.filter(|prop| !prop.is_empty()) else {
            return Err(ConfigError::InvalidPropertyName { index });
        };
        if let Some(reserved) = RESERVED_PROPERTY_NAMES.iter().find(|reserved| **reserved == prop) {
            return Err(ConfigError::ReservedPropertyName(*reserved));
        }
        if !seen.insert(prop) {
            return Err(ConfigError::DuplicatePropertyName(prop.to_owned()));
        }
    }
    Ok(())
}

/// Converts a loosely-typed options record into [`DefineOptions`].
///
/// Checks run in a fixed order (record shape, unknown keys, parent, default
/// message, property list) so the first broken rule is the one reported.
fn options_from_object(options: &Object) -> Result<DefineOptions, ConfigError> {
    let Object::Record(record) = options else {
        return Err(ConfigError::OptionsNotRecord);
    };
    if record.is_empty() {
        return Err(ConfigError::EmptyOptions);
    }
    if let Some(unknown) = record
        .keys()
        .find(|key| ![PARENT_OPTION, PROPS_OPTION, DEFAULT_MESSAGE_OPTION].contains(&key.as_str()))
    {
        return Err(ConfigError::UnknownOption(unknown.clone()));
    }

    let parent = match record.get(PARENT_OPTION) {
        None | Some(Object::Undefined) => None,
        Some(Object::Type(parent)) => Some(parent.clone()),
        Some(Object::Exception(instance)) => Some(instance.error_type().clone()),
        Some(_) => return Err(ConfigError::InvalidParent),
    };

    let default_message = match record.get(DEFAULT_MESSAGE_OPTION) {
        None | Some(Object::Undefined) => None,
        Some(Object::String(message)) if !message.is_empty() => Some(message.clone()),
        Some(_) => return Err(ConfigError::InvalidDefaultMessage),
    };

    let props = match record.get(PROPS_OPTION) {
        None | Some(Object::Undefined) => None,
        Some(Object::List(items)) => {
            check_props(items.iter().map(Object::as_str))?;
            Some(items.iter().filter_map(Object::as_str).map(str::to_owned).collect())
        }
        Some(_) => return Err(ConfigError::PropsNotList),
    };

    Ok(DefineOptions {
        parent,
        props,
        default_message,
    })
}
