#![doc = include_str!("../../../README.md")]

mod args;
mod error;
mod exception;
mod factory;
mod function;
mod object;
mod resolve;
mod stack;
pub mod tracer;

pub use crate::{
    args::ArgKind,
    error::{ConfigError, Error, ResolutionError, ResolveResult},
    exception::ExceptionInstance,
    factory::{DefineOptions, ErrorType, Factory, RESERVED_PROPERTY_NAMES, define, define_object},
    function::{Callable, FunctionRef},
    object::{InvalidInputError, Object, Record},
    resolve::{CallShape, ResolvedOptions, resolve, resolve_traced},
    stack::{BacktraceCapture, ShadowStack, StackCapture, StackStart},
};
