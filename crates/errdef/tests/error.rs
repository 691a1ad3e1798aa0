use std::error::Error as _;

use errdef::{ConfigError, Error, Object, ResolutionError, define};
use pretty_assertions::assert_eq;

#[test]
fn config_errors_convert_and_keep_their_source() {
    let err: Error = define("", None).unwrap_err().into();
    assert_eq!(err, Error::Config(ConfigError::InvalidName));
    assert_eq!(err.to_string(), "configuration error: name must be a non-empty string");
    assert_eq!(
        err.source().map(ToString::to_string),
        Some(ConfigError::InvalidName.to_string())
    );
}

#[test]
fn resolution_errors_convert_through_question_mark() {
    fn construct_bare(args: Vec<Object>) -> Result<String, Error> {
        let e = define("E", None)?;
        Ok(e.call(args)?.to_string())
    }

    assert_eq!(construct_bare(vec![Object::from("m")]).unwrap(), "E: m");
    let err = construct_bare(vec![Object::Int(1), Object::Int(2), Object::Int(3)]).unwrap_err();
    assert_eq!(err, Error::Resolution(ResolutionError::TooManyArguments { max: 2, got: 3 }));
    assert_eq!(err.to_string(), err.source().unwrap().to_string());
}

#[test]
fn invalid_input_converts_through_question_mark() {
    fn parse(value: serde_json::Value) -> Result<Object, Error> {
        Ok(Object::from_json(value)?)
    }

    let err = parse(serde_json::json!({ "$undefined": 1 })).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(err.source().is_some());
}
