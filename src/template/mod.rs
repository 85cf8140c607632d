//! Message Template Engine
//!
//! Messages are built by named-placeholder substitution: each of the five
//! templates in [`LoggerFormats`] is a string containing `${token}`
//! placeholders from a fixed vocabulary.
//!
//! | Placeholder                  | Value                                       |
//! |------------------------------|---------------------------------------------|
//! | `${method.name}`             | method name                                 |
//! | `${method.args}`             | rendered arguments, or `..` when skipped    |
//! | `${method.result}`           | rendered result, or `..` when skipped       |
//! | `${method.duration}`         | elapsed time, millisecond resolution        |
//! | `${method.warn.duration}`    | configured warning threshold                |
//! | `${error.class.name}`        | error type name                             |
//! | `${error.message}`           | error `Display` text                        |
//! | `${error.source.class.name}` | where the error was raised                  |
//! | `${error.source.line}`       | line the error was raised at                |
//!
//! # Components
//!
//! - **Formats** (`formats.rs`): the templates, their defaults, file loading
//!   and the process-wide installed set
//! - **Formatter** (`formatter.rs`): placeholder substitution and duration
//!   rendering

mod formats;
mod formatter;

#[cfg(test)]
mod proptest;

pub use formats::{
    current, install, LoggerFormats, DEFAULT_AFTER, DEFAULT_ENTER, DEFAULT_ERROR,
    DEFAULT_WARN_AFTER, DEFAULT_WARN_BEFORE,
};
pub use formatter::{
    format_duration, iso_duration, substitute, MessageContext, MessageFormatter, DOTS,
    UNKNOWN_LINE, UNKNOWN_SOURCE,
};
