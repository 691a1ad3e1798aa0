use std::{env, fmt, fs, io, process::ExitCode, time::Instant};

use errdef::{
    Error, ErrorType, Factory, Object, Record,
    tracer::{FactoryTracer, NoopTracer, StderrTracer},
};
use indexmap::IndexMap;
use serde::Deserialize;

/// Environment variable that turns on the stderr event log. A numeric value
/// caps the number of events printed.
const TRACE_ENV: &str = "ERRDEF_TRACE";

/// A scenario file: types to define, then constructor calls to run against them.
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    types: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    calls: Vec<Call>,
}

#[derive(Debug, Deserialize)]
struct Call {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    args: Vec<serde_json::Value>,
    /// Use explicit construction instead of a plain call.
    #[serde(default)]
    construct: bool,
}

/// Failures that abort a scenario run.
#[derive(Debug)]
enum CliError {
    Read { path: String, source: io::Error },
    Parse { path: String, source: serde_json::Error },
    /// A type definition was rejected.
    Define { index: usize, source: Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {path}: {source}"),
            Self::Parse { path, source } => write!(f, "cannot parse {path}: {source}"),
            Self::Define { index, source } => write!(f, "types[{index}]: {source}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Define { source, .. } => Some(source),
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "scenario.json" };
    let scenario = match read_scenario(file_path) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let result = match env::var(TRACE_ENV) {
        Ok(value) if !value.is_empty() => {
            let mut tracer = match value.parse::<usize>() {
                Ok(limit) => StderrTracer::with_limit(limit),
                Err(_) => StderrTracer::new(),
            };
            run(&scenario, &mut tracer)
        }
        _ => run(&scenario, &mut NoopTracer),
    };
    let elapsed = start.elapsed();
    match result {
        Ok(()) => {
            eprintln!("done after: {elapsed:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error after: {elapsed:?}\n{err}");
            ExitCode::FAILURE
        }
    }
}

/// Defines every type, then runs every call. A failed definition aborts the
/// run; a failed call is reported and the run continues.
fn run(scenario: &Scenario, tracer: &mut impl FactoryTracer) -> Result<(), CliError> {
    let factory = Factory::default();
    let mut types: IndexMap<String, ErrorType> = IndexMap::new();

    for (index, definition) in scenario.types.iter().enumerate() {
        let error_type = definition_objects(definition, &types)
            .and_then(|(name, options)| {
                factory
                    .define_object_traced(&name, options.as_ref(), tracer)
                    .map_err(Error::from)
            })
            .map_err(|source| CliError::Define { index, source })?;
        types.insert(error_type.name().to_owned(), error_type);
    }

    for (index, call) in scenario.calls.iter().enumerate() {
        let Some(error_type) = types.get(&call.type_name) else {
            println!("calls[{index}]: error: unknown type {}", call.type_name);
            continue;
        };
        match invoke(error_type, call, &types, tracer) {
            Ok(instance) => match serde_json::to_string_pretty(&instance) {
                Ok(json) => println!("calls[{index}]: {json}"),
                Err(err) => println!("calls[{index}]: error: {err}"),
            },
            Err(err) => println!("calls[{index}]: error: {err}"),
        }
    }
    Ok(())
}

fn invoke(
    error_type: &ErrorType,
    call: &Call,
    types: &IndexMap<String, ErrorType>,
    tracer: &mut impl FactoryTracer,
) -> Result<errdef::ExceptionInstance, Error> {
    let args = call
        .args
        .iter()
        .map(|arg| arg_object(arg, types))
        .collect::<Result<Vec<_>, _>>()?;
    let instance = if call.construct {
        error_type.construct_traced(args, tracer)?
    } else {
        error_type.call_traced(args, tracer)?
    };
    Ok(instance)
}

/// Splits a type definition into the name and options objects the factory
/// validates. A `parent` naming a type defined earlier is replaced by that
/// type; any other value is left for the factory to reject.
fn definition_objects(
    definition: &serde_json::Map<String, serde_json::Value>,
    types: &IndexMap<String, ErrorType>,
) -> Result<(Object, Option<Object>), Error> {
    let name = match definition.get("name") {
        Some(value) => Object::from_json(value.clone())?,
        None => Object::Undefined,
    };

    let mut options = Record::new();
    for (key, value) in definition {
        if key == "name" {
            continue;
        }
        let value = if key == "parent"
            && let Some(parent) = value.as_str().and_then(|parent| types.get(parent))
        {
            Object::Type(parent.clone())
        } else {
            Object::from_json(value.clone())?
        };
        options.insert(key.clone(), value);
    }

    let options = if options.is_empty() {
        None
    } else {
        Some(Object::Record(options))
    };
    Ok((name, options))
}

/// Converts a JSON argument, resolving `{"$type": "Name"}` against defined types.
fn arg_object(value: &serde_json::Value, types: &IndexMap<String, ErrorType>) -> Result<Object, Error> {
    if let Some(map) = value.as_object()
        && map.len() == 1
        && let Some(error_type) = map
            .get("$type")
            .and_then(serde_json::Value::as_str)
            .and_then(|name| types.get(name))
    {
        return Ok(Object::Type(error_type.clone()));
    }
    Object::from_json(value.clone()).map_err(Error::from)
}

fn read_scenario(file_path: &str) -> Result<Scenario, CliError> {
    eprintln!("Reading file: {file_path}");
    let text = fs::read_to_string(file_path).map_err(|source| CliError::Read {
        path: file_path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: file_path.to_owned(),
        source,
    })
}
