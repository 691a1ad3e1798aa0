use errdef::{
    CallShape, DefineOptions, Factory, FunctionRef, Object, ShadowStack,
    tracer::{ProfilingTracer, RecordingTracer, TraceEvent},
};
use pretty_assertions::assert_eq;

fn factory() -> Factory {
    Factory::new().with_stack_capture(ShadowStack::new(["main"]))
}

#[test]
fn successful_definition_and_construction_are_recorded() {
    let mut tracer = RecordingTracer::new();
    let factory = factory();
    let http = factory.define_traced("HttpError", None, &mut tracer).unwrap();
    let not_found = factory
        .define_traced(
            "NotFound",
            Some(DefineOptions::new().with_parent(http).with_props(["path", "method"])),
            &mut tracer,
        )
        .unwrap();
    not_found
        .construct_traced(
            vec![Object::from("/x"), Object::from("GET"), Object::Function(FunctionRef::new("main"))],
            &mut tracer,
        )
        .unwrap();

    assert_eq!(
        tracer.into_events(),
        vec![
            TraceEvent::TypeDefined {
                name: "HttpError".to_owned(),
                parent: None,
                prop_count: 0,
            },
            TraceEvent::TypeDefined {
                name: "NotFound".to_owned(),
                parent: Some("HttpError".to_owned()),
                prop_count: 2,
            },
            TraceEvent::ShapeMatched {
                shape: CallShape::PositionalWithExtra,
                arg_count: 3,
            },
            TraceEvent::InstanceCreated {
                type_name: "NotFound".to_owned(),
                field_count: 2,
            },
        ]
    );
}

#[test]
fn rejected_definition_is_recorded() {
    let mut tracer = RecordingTracer::new();
    let err = factory()
        .define_traced("E", Some(DefineOptions::new().with_props(["stack"])), &mut tracer)
        .unwrap_err();
    assert_eq!(
        tracer.events(),
        [TraceEvent::ConfigRejected {
            reason: err.to_string()
        }]
    );
}

#[test]
fn rejected_dynamic_definition_is_recorded() {
    let mut tracer = RecordingTracer::new();
    factory()
        .define_object_traced(&Object::Null, None, &mut tracer)
        .unwrap_err();
    assert_eq!(tracer.event_count(), 1);
    assert!(matches!(tracer.events()[0], TraceEvent::ConfigRejected { .. }));
}

#[test]
fn failed_resolution_records_the_committed_shape_then_the_failure() {
    let mut tracer = RecordingTracer::new();
    let e = factory().define("E", None).unwrap();
    let err = e
        .call_traced(vec![Object::from("a"), Object::from("b")], &mut tracer)
        .unwrap_err();
    assert_eq!(
        tracer.into_events(),
        vec![
            TraceEvent::ShapeMatched {
                shape: CallShape::MessageAndStackStart,
                arg_count: 2,
            },
            TraceEvent::ResolutionFailed {
                type_name: "E".to_owned(),
                reason: err.to_string(),
            },
        ]
    );
}

#[test]
fn unmatched_arguments_record_only_the_failure() {
    let mut tracer = RecordingTracer::new();
    let e = factory().define("E", None).unwrap();
    e.call_traced(vec![Object::Int(1), Object::Int(2), Object::Int(3)], &mut tracer)
        .unwrap_err();
    assert_eq!(tracer.event_count(), 1);
    assert!(matches!(tracer.events()[0], TraceEvent::ResolutionFailed { .. }));
}

#[test]
fn recording_stops_at_the_limit() {
    let mut tracer = RecordingTracer::with_limit(2);
    let e = factory().define_traced("E", None, &mut tracer).unwrap();
    e.call_traced(vec![], &mut tracer).unwrap();
    e.call_traced(vec![], &mut tracer).unwrap();
    assert_eq!(tracer.event_count(), 2);
}

#[test]
fn profiling_counts_shapes_and_outcomes() {
    let mut tracer = ProfilingTracer::new();
    let factory = factory();
    let e = factory
        .define_traced("E", Some(DefineOptions::new().with_props(["a"])), &mut tracer)
        .unwrap();
    factory
        .define_traced("", None, &mut tracer)
        .unwrap_err();

    e.call_traced(vec![Object::from("x")], &mut tracer).unwrap();
    e.call_traced(vec![Object::from("y")], &mut tracer).unwrap();
    e.call_traced(vec![Object::from("m"), Object::from("x")], &mut tracer)
        .unwrap();
    e.call_traced(vec![], &mut tracer).unwrap_err();

    let report = tracer.report();
    assert_eq!(report.types_defined, 1);
    assert_eq!(report.configs_rejected, 1);
    assert_eq!(report.instances_created, 3);
    assert_eq!(report.resolution_failures, 1);
    assert_eq!(
        report.shape_counts,
        vec![(CallShape::Positional, 2), (CallShape::PositionalWithExtra, 1)]
    );
    assert!(report.to_string().contains("Positional"));
}
