//! Stack trace capture for constructed exceptions.
//!
//! A trace is rendered as a header line (`Name: message`) followed by one
//! `    at <frame>` line per caller frame, innermost first. Capture is rooted
//! either at the constructor itself or at a caller-supplied stack-start
//! function: frames at or below the root are left out.

use std::{backtrace::Backtrace, fmt};

/// Where a captured trace starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStart<'a> {
    /// Root the trace just after the constructor of the named type.
    Constructor(&'a str),
    /// Root the trace just after the innermost frame of the named function.
    Function(&'a str),
}

/// Environment facility that produces the `stack` string of new instances.
///
/// Implementations must always return the header as the first line, so a
/// captured trace is never empty. When the start function cannot be located,
/// implementations fall back to the trace they would produce for
/// [`StackStart::Constructor`].
pub trait StackCapture: fmt::Debug + Send + Sync {
    fn capture(&self, header: &str, start: StackStart<'_>) -> String;
}

/// Captures the native call stack with [`std::backtrace::Backtrace`].
///
/// Frames inside the factory are always dropped. Symbol resolution depends on
/// debug info being available; without it frames show up unresolved but the
/// trace is still produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceCapture;

/// Symbol fragments identifying frames that belong to construction itself.
const CONSTRUCTOR_FRAMES: &[&str] = &[
    "ErrorType::construct",
    "ErrorType::call",
    "BacktraceCapture",
    "std::backtrace::Backtrace",
];

impl StackCapture for BacktraceCapture {
    fn capture(&self, header: &str, start: StackStart<'_>) -> String {
        let rendered = Backtrace::force_capture().to_string();
        let frames = parse_backtrace(&rendered);

        let base = frames
            .iter()
            .rposition(|frame| CONSTRUCTOR_FRAMES.iter().any(|own| frame.symbol.contains(own)))
            .map_or(0, |index| index + 1);
        let callers = &frames[base..];

        let kept = match start {
            StackStart::Constructor(_) => callers,
            StackStart::Function(name) => match callers.iter().position(|frame| symbol_matches(frame.symbol, name)) {
                Some(index) => &callers[index + 1..],
                None => callers,
            },
        };

        let mut out = String::from(header);
        for frame in kept {
            out.push_str("\n    at ");
            out.push_str(frame.symbol);
            if let Some(location) = frame.location {
                out.push_str(" (");
                out.push_str(location);
                out.push(')');
            }
        }
        out
    }
}

/// One frame of a rendered [`Backtrace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NativeFrame<'a> {
    symbol: &'a str,
    location: Option<&'a str>,
}

/// Splits the `Display` output of a [`Backtrace`] into frames, innermost first.
///
/// Each frame starts with an `N: symbol` line, optionally followed by an
/// `at file:line:col` line.
fn parse_backtrace(rendered: &str) -> Vec<NativeFrame<'_>> {
    let mut frames: Vec<NativeFrame<'_>> = Vec::new();
    for line in rendered.lines() {
        let trimmed = line.trim_start();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut()
                && frame.location.is_none()
            {
                frame.location = Some(location.trim_end());
            }
            continue;
        }
        if let Some((index, symbol)) = trimmed.split_once(": ")
            && !index.is_empty()
            && index.bytes().all(|b| b.is_ascii_digit())
        {
            frames.push(NativeFrame {
                symbol: symbol.trim_end(),
                location: None,
            });
        }
    }
    frames
}

/// Matches a frame symbol against a function name given as a full path or as
/// its trailing segments. Empty names never match.
fn symbol_matches(symbol: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if symbol == name {
        return true;
    }
    symbol
        .strip_suffix(name)
        .is_some_and(|prefix| prefix.ends_with("::"))
        || symbol.contains(&format!("::{name}::{{{{closure}}}}"))
}

/// A caller-maintained call stack.
///
/// Hosts that keep their own notion of the call stack (interpreters, request
/// pipelines) describe it here, outermost frame first. The constructor is not
/// part of the list, so a trace rooted at the constructor shows every frame.
///
/// ```
/// use errdef::{ShadowStack, StackCapture, StackStart};
///
/// let stack = ShadowStack::new(["main", "serve", "handle"]);
/// let trace = stack.capture("Oops", StackStart::Function("handle"));
/// assert_eq!(trace, "Oops\n    at serve\n    at main");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowStack {
    frames: Vec<String>,
}

impl ShadowStack {
    /// Creates a shadow stack from frame names, outermost first.
    #[must_use]
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }
}

impl StackCapture for ShadowStack {
    fn capture(&self, header: &str, start: StackStart<'_>) -> String {
        let innermost_first: Vec<&str> = self.frames.iter().rev().map(String::as_str).collect();
        let skip = match start {
            StackStart::Constructor(_) => 0,
            StackStart::Function(name) => innermost_first
                .iter()
                .position(|frame| !name.is_empty() && *frame == name)
                .map_or(0, |index| index + 1),
        };

        let mut out = String::from(header);
        for frame in &innermost_first[skip..] {
            out.push_str("\n    at ");
            out.push_str(frame);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const RENDERED: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/library/std/src/backtrace.rs:312:13
   1: errdef::factory::ErrorType::construct_traced
             at ./src/factory.rs:240:21
   2: app::validate
             at ./src/main.rs:10:5
   3: app::handle_request
             at ./src/main.rs:20:5
   4: app::main
   5: std::rt::lang_start";

    #[test]
    fn parses_symbols_and_locations() {
        let frames = parse_backtrace(RENDERED);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[2].symbol, "app::validate");
        assert_eq!(frames[2].location, Some("./src/main.rs:10:5"));
        assert_eq!(frames[4].location, None);
    }

    #[test]
    fn symbols_match_by_trailing_segments() {
        assert!(symbol_matches("app::handle_request", "handle_request"));
        assert!(symbol_matches("app::handle_request", "app::handle_request"));
        assert!(symbol_matches("app::handle_request::{{closure}}", "handle_request"));
        assert!(!symbol_matches("app::handle_requests", "handle_request"));
        assert!(!symbol_matches("app::my_handle_request", "handle_request"));
        assert!(!symbol_matches("app::handle_request", ""));
    }

    #[test]
    fn backtrace_capture_always_starts_with_the_header() {
        let trace = BacktraceCapture.capture("Boom: bad", StackStart::Constructor("Boom"));
        assert!(trace.starts_with("Boom: bad"));
    }

    #[test]
    fn shadow_stack_truncates_at_innermost_matching_frame() {
        let stack = ShadowStack::new(["main", "retry", "handle", "retry"]);
        assert_eq!(
            stack.capture("E", StackStart::Function("retry")),
            "E\n    at handle\n    at retry\n    at main"
        );
    }

    #[test]
    fn shadow_stack_falls_back_when_function_is_absent() {
        let stack = ShadowStack::new(["main", "handle"]);
        assert_eq!(
            stack.capture("E", StackStart::Function("missing")),
            stack.capture("E", StackStart::Constructor("E"))
        );
        assert_eq!(stack.capture("E", StackStart::Function("")), "E\n    at handle\n    at main");
    }
}
