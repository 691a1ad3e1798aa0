//! Factory and constructor tracing infrastructure.
//!
//! Provides a trait-based tracing system with zero-cost abstraction. Every
//! traced entry point takes the tracer as a generic parameter, so with
//! [`NoopTracer`] all hooks compile away entirely via monomorphization.
//!
//! # Architecture
//!
//! The [`FactoryTracer`] trait defines hook points at key events (type defined,
//! configuration rejected, call shape matched, resolution failed, instance
//! created). Concrete implementations collect different kinds of data:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable event log to stderr |
//! | [`ProfilingTracer`] | Call-shape frequency and failure counters |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! # Usage
//!
//! ```
//! use errdef::{DefineOptions, Factory, Object, tracer::RecordingTracer};
//!
//! let mut tracer = RecordingTracer::new();
//! let factory = Factory::default();
//! let not_found = factory
//!     .define_traced("NotFound", Some(DefineOptions::new().with_props(["path"])), &mut tracer)
//!     .unwrap();
//! not_found.construct_traced(vec![Object::from("/x")], &mut tracer).unwrap();
//! assert_eq!(tracer.event_count(), 3);
//! ```

use std::{collections::HashMap, fmt};

use strum::IntoStaticStr;

use crate::{
    error::{ConfigError, ResolutionError},
    resolve::CallShape,
};

/// Trace event emitted by the factory and by manufactured constructors.
///
/// Used by [`RecordingTracer`] to capture the full history of a session.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum TraceEvent {
    /// A new exception type was defined.
    TypeDefined {
        /// The declared type name.
        name: String,
        /// Name of the parent type, if any.
        parent: Option<String>,
        /// Number of declared payload properties.
        prop_count: usize,
    },
    /// A type definition was rejected.
    ConfigRejected {
        /// The rendered configuration error.
        reason: String,
    },
    /// The resolver committed to a call shape.
    ShapeMatched {
        shape: CallShape,
        /// Number of arguments supplied to the constructor.
        arg_count: usize,
    },
    /// Constructor arguments could not be resolved.
    ResolutionFailed {
        type_name: String,
        /// The rendered resolution error.
        reason: String,
    },
    /// An instance was constructed.
    InstanceCreated {
        type_name: String,
        /// Number of payload fields copied onto the instance.
        field_count: usize,
    },
}

/// Trait for factory and constructor tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait FactoryTracer: fmt::Debug {
    /// Called after a type definition passed validation.
    ///
    /// # Arguments
    /// * `name` - The declared type name
    /// * `parent` - Name of the parent type, if one was given
    /// * `props` - The declared payload property names, if any
    #[inline(always)]
    fn on_type_defined(&mut self, _name: &str, _parent: Option<&str>, _props: Option<&[String]>) {}

    /// Called when a type definition fails validation.
    #[inline(always)]
    fn on_config_rejected(&mut self, _error: &ConfigError) {}

    /// Called when the resolver commits to a call shape, before extraction.
    ///
    /// A committed shape can still fail, in which case
    /// [`on_resolution_failed`](Self::on_resolution_failed) follows.
    #[inline(always)]
    fn on_shape_matched(&mut self, _shape: CallShape, _arg_count: usize) {}

    /// Called when a constructor invocation fails to resolve its arguments.
    #[inline(always)]
    fn on_resolution_failed(&mut self, _type_name: &str, _error: &ResolutionError) {}

    /// Called after an instance has been fully constructed.
    #[inline(always)]
    fn on_instance_created(&mut self, _type_name: &str, _field_count: usize) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl FactoryTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable event log
// ============================================================================

/// Tracer that prints a human-readable event log to stderr.
///
/// Output format:
/// ```text
///   +++ DEFINE NotFound            parent=HttpError props=2
///   ... SHAPE  PositionalWithExtra args=3
///   >>> NEW    NotFound            fields=2
///   !!! FAIL   NotFound            missing required properties: ...
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of events to print before stopping. None = unlimited.
    limit: Option<usize>,
    /// Number of events printed so far.
    count: usize,
    /// Whether we've stopped tracing (hit the limit).
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: None,
            count: 0,
            stopped: false,
        }
    }

    /// Creates a new stderr tracer that stops after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
            stopped: false,
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} events) ---");
            self.stopped = true;
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryTracer for StderrTracer {
    fn on_type_defined(&mut self, name: &str, parent: Option<&str>, props: Option<&[String]>) {
        let parent = parent.unwrap_or("-");
        let prop_count = props.map_or(0, <[String]>::len);
        self.emit(format_args!("  +++ DEFINE {name:<20} parent={parent} props={prop_count}"));
    }

    fn on_config_rejected(&mut self, error: &ConfigError) {
        self.emit(format_args!("  !!! REJECT {error}"));
    }

    fn on_shape_matched(&mut self, shape: CallShape, arg_count: usize) {
        let shape: &'static str = shape.into();
        self.emit(format_args!("  ... SHAPE  {shape:<20} args={arg_count}"));
    }

    fn on_resolution_failed(&mut self, type_name: &str, error: &ResolutionError) {
        self.emit(format_args!("  !!! FAIL   {type_name:<20} {error}"));
    }

    fn on_instance_created(&mut self, type_name: &str, field_count: usize) {
        self.emit(format_args!("  >>> NEW    {type_name:<20} fields={field_count}"));
    }
}

// ============================================================================
// ProfilingTracer: call-shape frequency tracking
// ============================================================================

/// Tracer that counts which call shapes constructors are invoked with.
///
/// Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    /// Per-shape match counts.
    shape_counts: HashMap<CallShape, u64>,
    /// Total number of types defined.
    types_defined: u64,
    /// Total number of rejected type definitions.
    configs_rejected: u64,
    /// Total number of instances constructed.
    instances_created: u64,
    /// Total number of failed constructor invocations.
    resolution_failures: u64,
}

/// Summary report from a profiling trace.
#[derive(Debug)]
pub struct ProfilingReport {
    /// Per-shape match counts, sorted by frequency (highest first).
    pub shape_counts: Vec<(CallShape, u64)>,
    pub types_defined: u64,
    pub configs_rejected: u64,
    pub instances_created: u64,
    pub resolution_failures: u64,
}

impl ProfilingTracer {
    /// Creates a new profiling tracer with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a profiling report from the collected data.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut shape_counts: Vec<_> = self.shape_counts.iter().map(|(&k, &v)| (k, v)).collect();
        shape_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        ProfilingReport {
            shape_counts,
            types_defined: self.types_defined,
            configs_rejected: self.configs_rejected,
            instances_created: self.instances_created,
            resolution_failures: self.resolution_failures,
        }
    }
}

impl FactoryTracer for ProfilingTracer {
    fn on_type_defined(&mut self, _name: &str, _parent: Option<&str>, _props: Option<&[String]>) {
        self.types_defined += 1;
    }

    fn on_config_rejected(&mut self, _error: &ConfigError) {
        self.configs_rejected += 1;
    }

    #[inline]
    fn on_shape_matched(&mut self, shape: CallShape, _arg_count: usize) {
        *self.shape_counts.entry(shape).or_insert(0) += 1;
    }

    fn on_resolution_failed(&mut self, _type_name: &str, _error: &ResolutionError) {
        self.resolution_failures += 1;
    }

    fn on_instance_created(&mut self, _type_name: &str, _field_count: usize) {
        self.instances_created += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Factory Profiling Report ===")?;
        writeln!(f, "Types defined:       {}", self.types_defined)?;
        writeln!(f, "Configs rejected:    {}", self.configs_rejected)?;
        writeln!(f, "Instances created:   {}", self.instances_created)?;
        writeln!(f, "Resolution failures: {}", self.resolution_failures)?;
        writeln!(f)?;
        writeln!(f, "--- Call Shape Frequency ---")?;
        let total: u64 = self.shape_counts.iter().map(|(_, count)| count).sum();
        for (shape, count) in &self.shape_counts {
            let pct = (*count as f64 / total as f64) * 100.0;
            writeln!(f, "  {:<36} {count:>10}  ({pct:>5.1}%)", shape.to_string())?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records all events for post-mortem analysis.
///
/// Captures every trace event into a `Vec<TraceEvent>`. This allocates per
/// event, so use it for debugging and tests rather than hot paths.
#[derive(Debug)]
pub struct RecordingTracer {
    /// All recorded events in chronological order.
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    /// Creates a new recording tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            limit: None,
        }
    }

    /// Creates a new recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Returns the number of events recorded.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl Default for RecordingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryTracer for RecordingTracer {
    fn on_type_defined(&mut self, name: &str, parent: Option<&str>, props: Option<&[String]>) {
        self.record(TraceEvent::TypeDefined {
            name: name.to_owned(),
            parent: parent.map(String::from),
            prop_count: props.map_or(0, <[String]>::len),
        });
    }

    fn on_config_rejected(&mut self, error: &ConfigError) {
        self.record(TraceEvent::ConfigRejected {
            reason: error.to_string(),
        });
    }

    fn on_shape_matched(&mut self, shape: CallShape, arg_count: usize) {
        self.record(TraceEvent::ShapeMatched { shape, arg_count });
    }

    fn on_resolution_failed(&mut self, type_name: &str, error: &ResolutionError) {
        self.record(TraceEvent::ResolutionFailed {
            type_name: type_name.to_owned(),
            reason: error.to_string(),
        });
    }

    fn on_instance_created(&mut self, type_name: &str, field_count: usize) {
        self.record(TraceEvent::InstanceCreated {
            type_name: type_name.to_owned(),
            field_count,
        });
    }
}
