//! Tests for converting JSON input into `Object` values and serializing them back.

use errdef::{ArgKind, Error, FunctionRef, Object, define, record};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn scalars_map_to_their_natural_variants() {
    assert_eq!(Object::from_json(json!(null)).unwrap(), Object::Null);
    assert_eq!(Object::from_json(json!(true)).unwrap(), Object::Bool(true));
    assert_eq!(Object::from_json(json!(42)).unwrap(), Object::Int(42));
    assert_eq!(Object::from_json(json!(1.5)).unwrap(), Object::Float(1.5));
    assert_eq!(Object::from_json(json!("x")).unwrap(), Object::from("x"));
}

#[test]
fn objects_become_records_in_key_order() {
    let value = Object::from_json(json!({ "z": 1, "a": [true, null] })).unwrap();
    let record = value.as_record().unwrap();
    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a"]);
    assert_eq!(
        record.get("a"),
        Some(&Object::List(vec![Object::Bool(true), Object::Null]))
    );
}

#[test]
fn tagged_objects_become_functions_and_undefined() {
    let function = Object::from_json(json!({ "$function": "handler" })).unwrap();
    assert_eq!(function, Object::Function(FunctionRef::new("handler")));
    assert_eq!(function.kind(), ArgKind::Callable);

    let undefined = Object::from_json(json!({ "$undefined": true })).unwrap();
    assert_eq!(undefined, Object::Undefined);
}

#[test]
fn tag_keys_alongside_other_keys_are_plain_records() {
    let value = Object::from_json(json!({ "$function": "f", "other": 1 })).unwrap();
    assert_eq!(value.kind(), ArgKind::Record);
}

#[test]
fn malformed_tags_are_rejected() {
    let err = Object::from_json(json!({ "$function": 3 })).unwrap_err();
    assert!(err.message().contains("$function"));

    let err = Object::from_json(json!({ "$undefined": false })).unwrap_err();
    assert!(err.to_string().starts_with("invalid input: "));

    let err = Object::from_json(json!([{ "$type": "E" }])).unwrap_err();
    assert!(err.message().contains("$type"));

    let err: Error = err.into();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn objects_serialize_back_to_json() {
    let e = define("E", None).unwrap();
    let value = Object::Record(record! {
        "f" => FunctionRef::new("handler"),
        "t" => e,
        "u" => Object::Undefined,
        "n" => Object::List(vec![Object::Int(1), Object::Null]),
    });
    assert_eq!(
        serde_json::to_value(&value).unwrap(),
        json!({
            "f": { "$function": "handler" },
            "t": { "$type": "E" },
            "u": { "$undefined": true },
            "n": [1, null],
        })
    );
}

#[test]
fn display_is_compact() {
    let value = Object::Record(record! { "a" => "x", "b" => Object::List(vec![Object::Int(1)]) });
    assert_eq!(value.to_string(), "{a: \"x\", b: [1]}");
    assert_eq!(Object::Function(FunctionRef::new("f")).to_string(), "[function f]");
}
