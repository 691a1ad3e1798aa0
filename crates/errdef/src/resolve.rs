//! Call-shape resolution for manufactured constructors.
//!
//! A constructor accepts its message, payload properties and stack-start
//! function in several conventions:
//!
//! | Shape | Arguments |
//! |-------|-----------|
//! | [`CallShape::NoArguments`] | `E()` |
//! | [`CallShape::MessageOrStackStart`] | `E(msg)`, `E(fn)` |
//! | [`CallShape::MessageAndStackStart`] | `E(msg, fn)` |
//! | [`CallShape::Options`] | `E({p1, p2})` |
//! | [`CallShape::MessageAndOptions`] | `E(msg, {p1, p2})` |
//! | [`CallShape::OptionsAndStackStart`] | `E({p1, p2}, fn)` |
//! | [`CallShape::MessageOptionsAndStackStart`] | `E(msg, {p1, p2}, fn)` |
//! | [`CallShape::Positional`] | `E(p1, p2)` |
//! | [`CallShape::PositionalWithExtra`] | `E(msg, p1, p2)`, `E(p1, p2, fn)` |
//! | [`CallShape::PositionalWithMessageAndStackStart`] | `E(msg, p1, p2, fn)` |
//!
//! The first three apply to types without declared properties, the rest to
//! types with them. Each regime is a priority-ordered table of rules pairing a
//! structural predicate over the argument kinds with an extractor. The first
//! rule whose predicate matches commits: its extractor either produces the
//! options or fails, and no later rule is tried.

use strum::{Display, IntoStaticStr};

use crate::{
    args::{ArgKind, ArgValues, MESSAGE_KEY, STACK_START_KEY},
    error::{ResolutionError, ResolveResult},
    function::Callable,
    object::{Object, Record},
    tracer::{FactoryTracer, NoopTracer},
};

/// Maximum number of arguments accepted beyond the declared properties: one
/// leading message and one trailing stack-start function.
const MAX_EXTRA_ARGS: usize = 2;
/// Maximum number of arguments accepted by a type without declared properties.
const MAX_BARE_ARGS: usize = 2;

/// The call convention a constructor invocation was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum CallShape {
    NoArguments,
    MessageOrStackStart,
    MessageAndStackStart,
    Options,
    MessageAndOptions,
    OptionsAndStackStart,
    MessageOptionsAndStackStart,
    Positional,
    PositionalWithExtra,
    PositionalWithMessageAndStackStart,
}

/// Canonical result of resolving one constructor invocation.
///
/// When the type declares properties, `fields` holds exactly those names in
/// declaration order. Otherwise it is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// The message, after the default message has been applied.
    pub message: Option<String>,
    /// Marks where trace capture starts. Never copied onto the instance.
    pub stack_start_function: Option<Callable>,
    /// Payload properties keyed by declared name.
    pub fields: Record,
    /// The call shape that matched.
    pub shape: CallShape,
}

/// What an extractor pulls out of the arguments, before defaults are applied.
#[derive(Debug, Default)]
struct Parts {
    message: Option<String>,
    stack_start_function: Option<Callable>,
    fields: Record,
}

/// The arguments of one invocation together with the declared property names.
struct CallSite<'a> {
    args: ArgValues,
    props: &'a [String],
}

impl CallSite<'_> {
    fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn prop_count(&self) -> usize {
        self.props.len()
    }

    fn options_at(&self, index: usize) -> bool {
        self.args.is_options_record_at(index, self.props)
    }
}

/// One row of a dispatch table.
struct ShapeRule {
    shape: CallShape,
    matches: fn(&CallSite<'_>) -> bool,
    extract: fn(CallSite<'_>) -> ResolveResult<Parts>,
}

/// Rules for types without declared properties, in priority order.
const BARE_SHAPES: &[ShapeRule] = &[
    ShapeRule {
        shape: CallShape::NoArguments,
        matches: |site| site.arg_count() == 0,
        extract: |_| Ok(Parts::default()),
    },
    ShapeRule {
        shape: CallShape::MessageOrStackStart,
        matches: |site| site.arg_count() == 1,
        extract: extract_message_or_stack_start,
    },
    ShapeRule {
        shape: CallShape::MessageAndStackStart,
        matches: |site| site.arg_count() == 2,
        extract: extract_message_and_stack_start,
    },
];

/// Rules for types with declared properties, in priority order.
///
/// Record-based shapes come first so that a record carrying exactly the
/// declared names is never mistaken for a positional payload value.
const DECLARED_SHAPES: &[ShapeRule] = &[
    ShapeRule {
        shape: CallShape::Options,
        matches: |site| site.arg_count() == 1 && site.options_at(0),
        extract: extract_options,
    },
    ShapeRule {
        shape: CallShape::MessageAndOptions,
        matches: |site| site.arg_count() == 2 && site.args.kind(0) == Some(ArgKind::String) && site.options_at(1),
        extract: extract_message_and_options,
    },
    ShapeRule {
        shape: CallShape::OptionsAndStackStart,
        matches: |site| site.arg_count() == 2 && site.options_at(0) && site.args.kind(1) == Some(ArgKind::Callable),
        extract: extract_options_and_stack_start,
    },
    ShapeRule {
        shape: CallShape::MessageOptionsAndStackStart,
        matches: |site| {
            site.arg_count() == 3
                && site.args.kind(0) == Some(ArgKind::String)
                && site.options_at(1)
                && site.args.kind(2) == Some(ArgKind::Callable)
        },
        extract: extract_message_options_and_stack_start,
    },
    ShapeRule {
        shape: CallShape::Positional,
        matches: |site| site.arg_count() == site.prop_count(),
        extract: extract_positional,
    },
    ShapeRule {
        shape: CallShape::PositionalWithExtra,
        matches: |site| site.arg_count() == site.prop_count() + 1,
        extract: extract_positional_with_extra,
    },
    ShapeRule {
        shape: CallShape::PositionalWithMessageAndStackStart,
        matches: |site| site.arg_count() == site.prop_count() + MAX_EXTRA_ARGS,
        extract: extract_positional_with_message_and_stack_start,
    },
];

/// Resolves constructor arguments into canonical options.
///
/// `props` is the declared property list of the type being constructed; `None`
/// (or an empty list) selects the regime for types without properties. When no
/// message was supplied, or the supplied message is empty, `default_message`
/// takes its place.
pub fn resolve(
    args: Vec<Object>,
    props: Option<&[String]>,
    default_message: Option<&str>,
) -> ResolveResult<ResolvedOptions> {
    resolve_traced(args, props, default_message, &mut NoopTracer)
}

/// Same as [`resolve`], reporting the matched shape to `tracer`.
pub fn resolve_traced(
    args: Vec<Object>,
    props: Option<&[String]>,
    default_message: Option<&str>,
    tracer: &mut impl FactoryTracer,
) -> ResolveResult<ResolvedOptions> {
    let args = ArgValues::new(args);
    let (shape, parts) = match props {
        Some(props) if !props.is_empty() => resolve_declared(CallSite { args, props }, tracer)?,
        _ => resolve_bare(CallSite { args, props: &[] }, tracer)?,
    };

    let Parts {
        message,
        stack_start_function,
        fields,
    } = parts;
    let message = message
        .filter(|message| !message.is_empty())
        .or_else(|| default_message.filter(|default| !default.is_empty()).map(str::to_owned));

    Ok(ResolvedOptions {
        message,
        stack_start_function,
        fields,
        shape,
    })
}

fn resolve_bare(site: CallSite<'_>, tracer: &mut impl FactoryTracer) -> ResolveResult<(CallShape, Parts)> {
    let got = site.arg_count();
    dispatch(BARE_SHAPES, site, tracer).unwrap_or(Err(ResolutionError::TooManyArguments {
        max: MAX_BARE_ARGS,
        got,
    }))
}

fn resolve_declared(site: CallSite<'_>, tracer: &mut impl FactoryTracer) -> ResolveResult<(CallShape, Parts)> {
    if site.args.is_empty() {
        return Err(ResolutionError::MissingArguments {
            required: site.props.to_vec(),
        });
    }
    let got = site.arg_count();
    let max = site.prop_count() + MAX_EXTRA_ARGS;
    let required = site.props;
    dispatch(DECLARED_SHAPES, site, tracer).unwrap_or_else(|| {
        // every count from P to P + 2 has a rule, so only these two remain
        if got > max {
            Err(ResolutionError::TooManyArguments { max, got })
        } else {
            Err(ResolutionError::MissingProperties {
                required: required.to_vec(),
                got,
            })
        }
    })
}

/// Runs the first rule whose predicate matches, or returns `None` if none does.
fn dispatch(
    rules: &[ShapeRule],
    site: CallSite<'_>,
    tracer: &mut impl FactoryTracer,
) -> Option<ResolveResult<(CallShape, Parts)>> {
    let rule = rules.iter().find(|rule| (rule.matches)(&site))?;
    tracer.on_shape_matched(rule.shape, site.arg_count());
    Some((rule.extract)(site).map(|parts| (rule.shape, parts)))
}

fn extract_message_or_stack_start(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let mut parts = Parts::default();
    match site.args.take_first() {
        Some(Object::String(message)) => parts.message = Some(message),
        Some(other) => match other.into_callable() {
            Ok(callable) => parts.stack_start_function = Some(callable),
            Err(other) => return Err(ResolutionError::InvalidSingleArgument { kind: other.kind() }),
        },
        None => {}
    }
    Ok(parts)
}

fn extract_message_and_stack_start(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let message = site.args.take_first().map(expect_message).transpose()?;
    let stack_start_function = site.args.take_first().map(expect_callable).transpose()?;
    Ok(Parts {
        message,
        stack_start_function,
        fields: Record::new(),
    })
}

fn extract_options(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let record = take_options_record(&mut site.args, site.props)?;
    parts_from_record(record, site.props)
}

fn extract_message_and_options(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let message = site.args.take_first().map(expect_message).transpose()?;
    let record = take_options_record(&mut site.args, site.props)?;
    if record.contains_key(MESSAGE_KEY) {
        return Err(ResolutionError::RedundantMessage);
    }
    let mut parts = parts_from_record(record, site.props)?;
    parts.message = message;
    Ok(parts)
}

fn extract_options_and_stack_start(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let stack_start_function = site.args.take_last().map(expect_callable).transpose()?;
    let record = take_options_record(&mut site.args, site.props)?;
    if record.contains_key(STACK_START_KEY) {
        return Err(ResolutionError::RedundantStackStartFunction);
    }
    let mut parts = parts_from_record(record, site.props)?;
    parts.stack_start_function = stack_start_function;
    Ok(parts)
}

fn extract_message_options_and_stack_start(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let message = site.args.take_first().map(expect_message).transpose()?;
    let stack_start_function = site.args.take_last().map(expect_callable).transpose()?;
    let record = take_options_record(&mut site.args, site.props)?;
    if record.contains_key(MESSAGE_KEY) {
        return Err(ResolutionError::RedundantMessage);
    }
    if record.contains_key(STACK_START_KEY) {
        return Err(ResolutionError::RedundantStackStartFunction);
    }
    let mut parts = parts_from_record(record, site.props)?;
    parts.message = message;
    parts.stack_start_function = stack_start_function;
    Ok(parts)
}

fn extract_positional(site: CallSite<'_>) -> ResolveResult<Parts> {
    Ok(Parts {
        fields: assign_positional(site.args, site.props),
        ..Parts::default()
    })
}

/// Strips a single extra argument before positional assignment.
///
/// A trailing callable is taken as the stack-start function before a leading
/// string is considered as the message, so `E(p1, p2, fn)` keeps a string `p1`
/// as a payload value.
fn extract_positional_with_extra(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    let mut parts = Parts::default();
    if site.args.last_kind() == Some(ArgKind::Callable) {
        parts.stack_start_function = site.args.take_last().map(expect_callable).transpose()?;
    } else if site.args.first_kind() == Some(ArgKind::String) {
        parts.message = site.args.take_first().map(expect_message).transpose()?;
    } else {
        return Err(ResolutionError::InvalidExtraArgument);
    }
    parts.fields = assign_positional(site.args, site.props);
    Ok(parts)
}

fn extract_positional_with_message_and_stack_start(mut site: CallSite<'_>) -> ResolveResult<Parts> {
    if site.args.first_kind() != Some(ArgKind::String) || site.args.last_kind() != Some(ArgKind::Callable) {
        return Err(ResolutionError::InvalidExtraArguments);
    }
    let message = site.args.take_first().map(expect_message).transpose()?;
    let stack_start_function = site.args.take_last().map(expect_callable).transpose()?;
    Ok(Parts {
        message,
        stack_start_function,
        fields: assign_positional(site.args, site.props),
    })
}

/// Pairs the remaining arguments with the declared names, one to one.
fn assign_positional(args: ArgValues, props: &[String]) -> Record {
    props.iter().cloned().zip(args.into_vec()).collect()
}

/// Takes the options record the rule's predicate located at the front of the
/// remaining arguments.
///
/// Anything else there means the declared properties were never supplied.
fn take_options_record(args: &mut ArgValues, props: &[String]) -> ResolveResult<Record> {
    let got = args.len();
    match args.take_first() {
        Some(Object::Record(record)) => Ok(record),
        _ => Err(ResolutionError::MissingProperties {
            required: props.to_vec(),
            got,
        }),
    }
}

/// Splits an options record into message, stack-start function and payload.
///
/// A `message` or `stackStartFunction` key holding `Undefined` or `Null` counts
/// as unset. Payload fields are reordered to declaration order.
fn parts_from_record(mut record: Record, props: &[String]) -> ResolveResult<Parts> {
    let message = record
        .swap_remove(MESSAGE_KEY)
        .and_then(present)
        .map(expect_message)
        .transpose()?;
    let stack_start_function = record
        .swap_remove(STACK_START_KEY)
        .and_then(present)
        .map(expect_callable)
        .transpose()?;
    let fields = props
        .iter()
        .filter_map(|prop| record.swap_remove_entry(prop.as_str()))
        .collect();
    Ok(Parts {
        message,
        stack_start_function,
        fields,
    })
}

/// Drops values that stand for "not given".
fn present(value: Object) -> Option<Object> {
    match value {
        Object::Undefined | Object::Null => None,
        other => Some(other),
    }
}

fn expect_message(value: Object) -> ResolveResult<String> {
    match value {
        Object::String(message) => Ok(message),
        other => Err(ResolutionError::MessageNotString { kind: other.kind() }),
    }
}

fn expect_callable(value: Object) -> ResolveResult<Callable> {
    value
        .into_callable()
        .map_err(|other| ResolutionError::StackStartNotCallable { kind: other.kind() })
}
