//! Tests for type definition: typed and dynamic configuration, validation
//! order and the parent chain.

use errdef::{ConfigError, DefineOptions, ErrorType, Factory, Object, RESERVED_PROPERTY_NAMES, define, define_object, record};
use pretty_assertions::assert_eq;

fn define_err(name: &str, options: DefineOptions) -> ConfigError {
    define(name, Some(options)).unwrap_err()
}

fn object_err(name: Object, options: Object) -> ConfigError {
    define_object(&name, Some(&options)).unwrap_err()
}

// === Typed configuration ===

#[test]
fn name_only_defines_a_bare_type() {
    let boom = define("Boom", None).unwrap();
    assert_eq!(boom.name(), "Boom");
    assert!(boom.parent().is_none());
    assert!(boom.props().is_none());
    assert!(boom.default_message().is_none());
}

#[test]
fn empty_name_is_rejected() {
    assert_eq!(define("", None).unwrap_err(), ConfigError::InvalidName);
}

#[test]
fn options_without_any_setting_are_rejected() {
    assert_eq!(define_err("E", DefineOptions::new()), ConfigError::EmptyOptions);
}

#[test]
fn empty_default_message_is_rejected() {
    let err = define_err("E", DefineOptions::new().with_default_message(""));
    assert_eq!(err, ConfigError::InvalidDefaultMessage);
}

#[test]
fn empty_property_list_is_rejected() {
    let err = define_err("E", DefineOptions::new().with_props(Vec::<String>::new()));
    assert_eq!(err, ConfigError::EmptyProps);
    assert_eq!(err.to_string(), "properties list must be a non-empty list");
}

#[test]
fn empty_property_name_is_rejected_with_its_index() {
    let err = define_err("E", DefineOptions::new().with_props(["a", ""]));
    assert_eq!(err, ConfigError::InvalidPropertyName { index: 1 });
}

#[test]
fn reserved_property_names_are_rejected_at_any_position() {
    for reserved in RESERVED_PROPERTY_NAMES {
        for props in [vec![reserved, "b"], vec!["a", reserved], vec!["a", "b", reserved]] {
            let err = define_err("E", DefineOptions::new().with_props(props));
            assert_eq!(err, ConfigError::ReservedPropertyName(reserved));
            assert_eq!(err.to_string(), format!("\"{reserved}\" is a reserved property name"));
        }
    }
}

#[test]
fn duplicate_property_names_are_rejected() {
    let err = define_err("E", DefineOptions::new().with_props(["a", "b", "a"]));
    assert_eq!(err, ConfigError::DuplicatePropertyName("a".to_owned()));
}

#[test]
fn declared_properties_keep_their_order() {
    let e = define("E", Some(DefineOptions::new().with_props(["z", "a", "m"]))).unwrap();
    assert_eq!(e.props(), Some(["z".to_owned(), "a".to_owned(), "m".to_owned()].as_slice()));
}

#[test]
fn separately_defined_types_are_distinct() {
    let first = define("Same", None).unwrap();
    let second = define("Same", None).unwrap();
    assert_ne!(first, second);
    assert_eq!(first, first.clone());
}

// === Inheritance ===

#[test]
fn parent_chain_is_walked_nearest_first() {
    let base = define("Base", None).unwrap();
    let http = define("HttpError", Some(DefineOptions::new().with_parent(base.clone()))).unwrap();
    let not_found = define("NotFound", Some(DefineOptions::new().with_parent(http.clone()))).unwrap();

    let names: Vec<&str> = not_found.ancestors().map(ErrorType::name).collect();
    assert_eq!(names, ["NotFound", "HttpError", "Base"]);

    assert!(not_found.is_subtype_of(&base));
    assert!(not_found.is_subtype_of(&not_found));
    assert!(!base.is_subtype_of(&not_found));
}

#[test]
fn parent_may_be_given_as_an_instance() {
    let http = define("HttpError", None).unwrap();
    let instance = http.construct(vec![]).unwrap();
    let child = define("Child", Some(DefineOptions::new().with_parent_instance(&instance))).unwrap();
    assert_eq!(child.parent(), Some(&http));
}

#[test]
fn child_does_not_inherit_properties_or_default_message() {
    let base = define(
        "Base",
        Some(DefineOptions::new().with_props(["a"]).with_default_message("base")),
    )
    .unwrap();
    let child = define("Child", Some(DefineOptions::new().with_parent(base))).unwrap();
    assert!(child.props().is_none());
    assert_eq!(child.construct(vec![]).unwrap().message(), "");
}

// === Dynamic configuration ===

#[test]
fn non_string_name_is_rejected() {
    assert_eq!(define_object(&Object::Int(1), None).unwrap_err(), ConfigError::InvalidName);
    assert_eq!(define_object(&Object::Undefined, None).unwrap_err(), ConfigError::InvalidName);
    assert_eq!(define_object(&Object::from(""), None).unwrap_err(), ConfigError::InvalidName);
}

#[test]
fn undefined_or_null_options_count_as_absent() {
    for absent in [Object::Undefined, Object::Null] {
        let e = define_object(&"E".into(), Some(&absent)).unwrap();
        assert_eq!(e.name(), "E");
        assert!(e.props().is_none());
        assert!(e.parent().is_none());
    }
}

#[test]
fn options_must_be_a_non_empty_record() {
    assert_eq!(object_err("E".into(), Object::from("x")), ConfigError::OptionsNotRecord);
    assert_eq!(object_err("E".into(), Object::Record(record! {})), ConfigError::EmptyOptions);
}

#[test]
fn unknown_options_are_reported_by_name() {
    let err = object_err("E".into(), Object::Record(record! { "props" => "a", "extra" => 1 }));
    assert_eq!(err, ConfigError::UnknownOption("extra".to_owned()));
    assert_eq!(err.to_string(), "unknown option \"extra\"");
}

#[test]
fn parent_must_be_a_type_or_an_instance() {
    let err = object_err("E".into(), Object::Record(record! { "parent" => "Base" }));
    assert_eq!(err, ConfigError::InvalidParent);

    let base = define("Base", None).unwrap();
    let instance = base.construct(vec![]).unwrap();
    let from_type = define_object(
        &"A".into(),
        Some(&Object::Record(record! { "parent" => base.clone() })),
    )
    .unwrap();
    let from_instance = define_object(&"B".into(), Some(&Object::Record(record! { "parent" => instance }))).unwrap();
    assert_eq!(from_type.parent(), Some(&base));
    assert_eq!(from_instance.parent(), Some(&base));
}

#[test]
fn default_message_must_be_a_non_empty_string() {
    let err = object_err("E".into(), Object::Record(record! { "defaultMsg" => 3 }));
    assert_eq!(err, ConfigError::InvalidDefaultMessage);
    let err = object_err("E".into(), Object::Record(record! { "defaultMsg" => "" }));
    assert_eq!(err, ConfigError::InvalidDefaultMessage);
}

#[test]
fn props_must_be_a_list_of_non_empty_strings() {
    let err = object_err("E".into(), Object::Record(record! { "props" => "a" }));
    assert_eq!(err, ConfigError::PropsNotList);

    let err = object_err(
        "E".into(),
        Object::Record(record! { "props" => Object::List(vec![]) }),
    );
    assert_eq!(err, ConfigError::EmptyProps);

    let err = object_err(
        "E".into(),
        Object::Record(record! { "props" => Object::List(vec!["a".into(), Object::Int(2)]) }),
    );
    assert_eq!(err, ConfigError::InvalidPropertyName { index: 1 });

    let err = object_err(
        "E".into(),
        Object::Record(record! { "props" => Object::List(vec!["a".into(), "message".into()]) }),
    );
    assert_eq!(err, ConfigError::ReservedPropertyName("message"));
}

#[test]
fn dynamic_configuration_builds_the_same_type_as_typed() {
    let e = define_object(
        &"QueryError".into(),
        Some(&Object::Record(record! {
            "props" => Object::List(vec!["table".into(), "code".into()]),
            "defaultMsg" => "query failed",
        })),
    )
    .unwrap();
    assert_eq!(e.props(), Some(["table".to_owned(), "code".to_owned()].as_slice()));
    assert_eq!(e.default_message(), Some("query failed"));
}

#[test]
fn factory_methods_match_free_functions() {
    let factory = Factory::new();
    assert_eq!(factory.define("", None).unwrap_err(), ConfigError::InvalidName);
    let e = factory.define("E", Some(DefineOptions::new().with_props(["a"]))).unwrap();
    assert_eq!(e.to_string(), "E");
}
