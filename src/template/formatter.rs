//! Message Formatter
//!
//! Resolves the `${token}` placeholders of a [`LoggerFormats`] template
//! against the values of one call.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::classify::CallError;
use crate::render::{render, render_args, Value};
use crate::spec::LogSpec;

use super::formats::LoggerFormats;

/// Rendering of skipped arguments or results
pub const DOTS: &str = "..";

/// Error source rendered when the origin is unknown
pub const UNKNOWN_SOURCE: &str = "somewhere";

/// Error line rendered when the origin is unknown
pub const UNKNOWN_LINE: i64 = -1;

const METHOD_NAME: &str = "method.name";
const METHOD_ARGS: &str = "method.args";
const METHOD_RESULT: &str = "method.result";
const METHOD_DURATION: &str = "method.duration";
const METHOD_WARN_DURATION: &str = "method.warn.duration";
const ERROR_CLASS_NAME: &str = "error.class.name";
const ERROR_MESSAGE: &str = "error.message";
const ERROR_SOURCE_CLASS_NAME: &str = "error.source.class.name";
const ERROR_SOURCE_LINE: &str = "error.source.line";

// =============================================================================
// Message Context
// =============================================================================

/// What the formatter needs to know about a call
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    pub method: &'a str,
    pub args: &'a [Value],
    pub spec: &'a LogSpec,
}

impl<'a> MessageContext<'a> {
    pub fn new(method: &'a str, args: &'a [Value], spec: &'a LogSpec) -> Self {
        Self { method, args, spec }
    }

    fn args_string(&self) -> String {
        if self.spec.skip_args {
            DOTS.to_string()
        } else {
            render_args(self.args)
        }
    }

    fn result_string(&self, result: &Value) -> String {
        if self.spec.skip_result {
            DOTS.to_string()
        } else {
            render(result)
        }
    }

    fn warn_duration_string(&self) -> String {
        self.spec
            .warn_threshold_millis()
            .map(|millis| iso_duration(u64::try_from(millis).unwrap_or(0)))
            .unwrap_or_default()
    }
}

// =============================================================================
// Message Formatter
// =============================================================================

/// Builds the five kinds of call messages
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    formats: Arc<LoggerFormats>,
}

impl MessageFormatter {
    pub fn new(formats: Arc<LoggerFormats>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &LoggerFormats {
        &self.formats
    }

    pub fn enter(&self, ctx: &MessageContext<'_>) -> String {
        let values = self.base_values(ctx);
        substitute(&self.formats.enter, &values)
    }

    pub fn warn_before(&self, ctx: &MessageContext<'_>, elapsed: Duration) -> String {
        let mut values = self.base_values(ctx);
        values.insert(METHOD_DURATION, format_duration(elapsed));
        values.insert(METHOD_WARN_DURATION, ctx.warn_duration_string());
        substitute(&self.formats.warn_before, &values)
    }

    pub fn warn_after(&self, ctx: &MessageContext<'_>, result: &Value, elapsed: Duration) -> String {
        let mut values = self.base_values(ctx);
        values.insert(METHOD_RESULT, ctx.result_string(result));
        values.insert(METHOD_DURATION, format_duration(elapsed));
        values.insert(METHOD_WARN_DURATION, ctx.warn_duration_string());
        substitute(&self.formats.warn_after, &values)
    }

    pub fn after(&self, ctx: &MessageContext<'_>, result: &Value, elapsed: Duration) -> String {
        let mut values = self.base_values(ctx);
        values.insert(METHOD_RESULT, ctx.result_string(result));
        values.insert(METHOD_DURATION, format_duration(elapsed));
        substitute(&self.formats.after, &values)
    }

    pub fn error<E: CallError + ?Sized>(
        &self,
        ctx: &MessageContext<'_>,
        elapsed: Duration,
        err: &E,
    ) -> String {
        let mut values = self.base_values(ctx);
        values.insert(METHOD_DURATION, format_duration(elapsed));
        values.insert(ERROR_CLASS_NAME, err.class_name().to_string());
        values.insert(ERROR_MESSAGE, err.to_string());
        match err.origin() {
            Some(origin) => {
                values.insert(ERROR_SOURCE_CLASS_NAME, origin.source.to_string());
                values.insert(ERROR_SOURCE_LINE, origin.line.to_string());
            }
            None => {
                values.insert(ERROR_SOURCE_CLASS_NAME, UNKNOWN_SOURCE.to_string());
                values.insert(ERROR_SOURCE_LINE, UNKNOWN_LINE.to_string());
            }
        }
        substitute(&self.formats.error, &values)
    }

    fn base_values(&self, ctx: &MessageContext<'_>) -> HashMap<&'static str, String> {
        let mut values = HashMap::with_capacity(8);
        values.insert(METHOD_NAME, ctx.method.to_string());
        values.insert(METHOD_ARGS, ctx.args_string());
        values
    }
}

// =============================================================================
// Substitution
// =============================================================================

/// Replace every `${token}` in `template` with its value.
///
/// Unknown tokens and an unterminated `${` are kept as written. `$${` is an
/// escaped, literal `${`.
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(escaped) = tail.strip_prefix("$${") {
            out.push_str("${");
            rest = escaped;
        } else if let Some(body) = tail.strip_prefix("${") {
            match body.find('}') {
                Some(end) => {
                    match values.get(&body[..end]) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&tail[..end + 3]),
                    }
                    rest = &body[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

// =============================================================================
// Durations
// =============================================================================

/// Render a duration at millisecond resolution, e.g. `PT1.5S`.
///
/// The sub-millisecond part is discarded, not rounded.
pub fn format_duration(elapsed: Duration) -> String {
    iso_duration(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// ISO-8601 rendering of a millisecond count: `PT0S`, `PT0.002S`, `PT2S`,
/// `PT1M30.5S`, `PT26H`
pub fn iso_duration(millis: u64) -> String {
    if millis == 0 {
        return "PT0S".to_string();
    }

    let total_secs = millis / 1_000;
    let fraction = millis % 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let mut out = String::from("PT");
    if hours != 0 {
        let _ = write!(out, "{}H", hours);
    }
    if minutes != 0 {
        let _ = write!(out, "{}M", minutes);
    }
    if secs == 0 && fraction == 0 {
        return out;
    }
    let _ = write!(out, "{}", secs);
    if fraction > 0 {
        let digits = format!("{:03}", fraction);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('S');
    out
}

// =============================================================================
// Tests
// =============================================================================
