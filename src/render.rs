//! Argument Renderer
//!
//! Turns call arguments and results into the display strings used in log
//! messages. Values are captured as [`Value`]s at the call boundary so that
//! rendering never runs user code and can neither fail nor panic.
//!
//! | Value                          | Rendered as                   |
//! |--------------------------------|-------------------------------|
//! | `None`, `()`                   | `NULL`                        |
//! | `&str`, `String`               | `'text'`                      |
//! | empty display string           | `''`                          |
//! | slices, `Vec`, arrays          | `[a, b, c]`                   |
//! | `f32`, `f64` and their slices  | Rust `Debug` form: `1.0`, `1e20`, `inf`, `NaN` |
//! | anything else                  | its `Display` form            |
//! | a `Display` impl that errors   | `[unknown]`                   |

use std::borrow::Cow;
use std::fmt::{self, Write};
use std::sync::Arc;

/// Rendering of a missing value
pub const NULL: &str = "NULL";

/// Rendering of a value that could not be turned into text
pub const UNKNOWN: &str = "[unknown]";

// =============================================================================
// Value
// =============================================================================

/// A captured argument or result, ready to be rendered
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Text value, always quoted
    Text(String),
    /// Default string form of any other value, quoted only when empty
    Display(String),
    /// Container of arbitrary values, rendered recursively
    Sequence(Vec<Value>),
    /// Container of primitives, rendered with per-element formatting
    Primitives(PrimitiveArray),
    /// Value that could not be captured
    Unknown,
}

impl Value {
    /// Capture the `Display` form of `value`.
    ///
    /// A `Display` impl that reports an error yields [`Value::Unknown`].
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        let mut text = String::new();
        match write!(text, "{}", value) {
            Ok(()) => Value::Display(text),
            Err(_) => Value::Unknown,
        }
    }

    /// Capture a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }
}

/// Homogeneous primitive containers
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bool(Vec<bool>),
    Char(Vec<char>),
    Signed(Vec<i64>),
    Unsigned(Vec<u64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray {
    fn render_into(&self, out: &mut String) {
        match self {
            PrimitiveArray::Bool(items) => join_into(out, items, |out, v| push_display(out, v)),
            PrimitiveArray::Char(items) => join_into(out, items, |out, v| out.push(*v)),
            PrimitiveArray::Signed(items) => join_into(out, items, |out, v| push_display(out, v)),
            PrimitiveArray::Unsigned(items) => {
                join_into(out, items, |out, v| push_display(out, v))
            }
            PrimitiveArray::Float(items) => join_into(out, items, |out, v| push_float(out, v)),
            PrimitiveArray::Double(items) => join_into(out, items, |out, v| push_float(out, v)),
        }
    }
}

// =============================================================================
// ToValue
// =============================================================================

/// Conversion into a loggable [`Value`]
///
/// Implement this for domain types that appear as arguments or results of
/// instrumented calls, usually via [`Value::display`].
pub trait ToValue {
    fn to_value(&self) -> Value;

    /// Capture a slice of `Self`.
    ///
    /// Primitive types override this so their containers render with
    /// per-element formatting.
    #[doc(hidden)]
    fn slice_to_value(items: &[Self]) -> Value
    where
        Self: Sized,
    {
        Value::Sequence(items.iter().map(ToValue::to_value).collect())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Cow<'_, str> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::display(self)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Primitives(PrimitiveArray::Bool(items.to_vec()))
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::display(self)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Primitives(PrimitiveArray::Char(items.to_vec()))
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        let mut text = String::new();
        push_float(&mut text, self);
        Value::Display(text)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Primitives(PrimitiveArray::Float(items.to_vec()))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        let mut text = String::new();
        push_float(&mut text, self);
        Value::Display(text)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Primitives(PrimitiveArray::Double(items.to_vec()))
    }
}

macro_rules! signed_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::display(self)
            }

            fn slice_to_value(items: &[Self]) -> Value {
                Value::Primitives(PrimitiveArray::Signed(
                    items.iter().map(|v| *v as i64).collect(),
                ))
            }
        }
    )*};
}

macro_rules! unsigned_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::display(self)
            }

            fn slice_to_value(items: &[Self]) -> Value {
                Value::Primitives(PrimitiveArray::Unsigned(
                    items.iter().map(|v| *v as u64).collect(),
                ))
            }
        }
    )*};
}

signed_to_value!(i8, i16, i32, i64, isize);
unsigned_to_value!(u8, u16, u32, u64, usize);

impl ToValue for i128 {
    fn to_value(&self) -> Value {
        Value::display(self)
    }
}

impl ToValue for u128 {
    fn to_value(&self) -> Value {
        Value::display(self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

/// Capture call arguments as a `Vec<Value>`.
///
/// ```
/// let args = loggable::call_args!["str", 10];
/// assert_eq!(loggable::render::render_args(&args), "['str', 10]");
/// ```
#[macro_export]
macro_rules! call_args {
    () => {
        ::std::vec::Vec::<$crate::render::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::render::ToValue::to_value(&$arg)),+]
    };
}

// =============================================================================
// Rendering
// =============================================================================

/// Render a single value
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    render_into(&mut out, value);
    out
}

/// Render an argument list as one container, e.g. `['str', 10]`
pub fn render_args(args: &[Value]) -> String {
    let mut out = String::new();
    join_into(&mut out, args, render_into);
    out
}

fn render_into(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str(NULL),
        Value::Text(text) => quote_into(out, text),
        Value::Display(text) if text.is_empty() => quote_into(out, text),
        Value::Display(text) => out.push_str(text),
        Value::Sequence(items) => join_into(out, items, render_into),
        Value::Primitives(array) => array.render_into(out),
        Value::Unknown => out.push_str(UNKNOWN),
    }
}

fn quote_into(out: &mut String, text: &str) {
    out.push('\'');
    out.push_str(text);
    out.push('\'');
}

fn join_into<T>(out: &mut String, items: &[T], mut render: impl FnMut(&mut String, &T)) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render(out, item);
    }
    out.push(']');
}

fn push_display<T: fmt::Display>(out: &mut String, value: &T) {
    // Writing into a String only fails if the Display impl itself does
    if write!(out, "{}", value).is_err() {
        out.push_str(UNKNOWN);
    }
}

/// Floats keep their fractional part (`1.0`, not `1`)
fn push_float<T: fmt::Debug>(out: &mut String, value: &T) {
    if write!(out, "{:?}", value).is_err() {
        out.push_str(UNKNOWN);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: u32,
    }

    impl fmt::Display for Account {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Account({})", self.id)
        }
    }

    impl ToValue for Account {
        fn to_value(&self) -> Value {
            Value::display(self)
        }
    }

    struct Blank;

    impl fmt::Display for Blank {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    // =========================================================================
    // Scalar Tests
    // =========================================================================

    #[test]
    fn test_render_null() {
        assert_eq!(render(&Value::Null), "NULL");
        assert_eq!(render(&().to_value()), "NULL");
        assert_eq!(render(&None::<i32>.to_value()), "NULL");
    }

    #[test]
    fn test_render_text_is_quoted() {
        assert_eq!(render(&"x".to_value()), "'x'");
        assert_eq!(render(&String::from("hello").to_value()), "'hello'");
        assert_eq!(render(&"".to_value()), "''");
    }

    #[test]
    fn test_render_display_values() {
        assert_eq!(render(&5i32.to_value()), "5");
        assert_eq!(render(&true.to_value()), "true");
        assert_eq!(render(&'c'.to_value()), "c");
        assert_eq!(render(&1.5f64.to_value()), "1.5");
        assert_eq!(render(&2.0f32.to_value()), "2.0");
        assert_eq!(render(&Some(7u8).to_value()), "7");
        assert_eq!(render(&Account { id: 3 }.to_value()), "Account(3)");
    }

    #[test]
    fn test_render_empty_display_is_quoted() {
        assert_eq!(render(&Value::display(&Blank)), "''");
    }

    #[test]
    fn test_render_failing_display_is_unknown() {
        assert_eq!(Value::display(&Broken), Value::Unknown);
        assert_eq!(render(&Value::display(&Broken)), "[unknown]");
    }

    // =========================================================================
    // Container Tests
    // =========================================================================

    #[test]
    fn test_render_primitive_containers() {
        assert_eq!(render(&[1i32, 2, 3].to_value()), "[1, 2, 3]");
        assert_eq!(render(&vec![true, false].to_value()), "[true, false]");
        assert_eq!(render(&[1.2f32, 3.4, 5.6].to_value()), "[1.2, 3.4, 5.6]");
        assert_eq!(render(&['a', 'b'].to_value()), "[a, b]");
        assert_eq!(render(&[255u8, 0].to_value()), "[255, 0]");
        assert_eq!(render(&Vec::<i32>::new().to_value()), "[]");
    }

    #[test]
    fn test_render_floats_in_debug_form() {
        assert_eq!(render(&f64::INFINITY.to_value()), "inf");
        assert_eq!(render(&f32::NAN.to_value()), "NaN");
        assert_eq!(render(&1e10f64.to_value()), "10000000000.0");
        assert_eq!(
            render(&[1.0f64, f64::NEG_INFINITY].to_value()),
            "[1.0, -inf]"
        );
    }

    #[test]
    fn test_primitive_containers_are_tagged() {
        assert_eq!(
            [1i16, 2].to_value(),
            Value::Primitives(PrimitiveArray::Signed(vec![1, 2]))
        );
        assert_eq!(
            vec![1.0f64].to_value(),
            Value::Primitives(PrimitiveArray::Double(vec![1.0]))
        );
    }

    #[test]
    fn test_render_object_containers_recurse() {
        let value = vec!["a", "b"].to_value();
        assert_eq!(render(&value), "['a', 'b']");

        let nested = vec![vec![1i64, 2], vec![3]].to_value();
        assert_eq!(render(&nested), "[[1, 2], [3]]");

        let mixed = vec![Some(Account { id: 1 }), None].to_value();
        assert_eq!(render(&mixed), "[Account(1), NULL]");

        let with_unknown = Value::Sequence(vec![Value::Unknown, 4u32.to_value()]);
        assert_eq!(render(&with_unknown), "[[unknown], 4]");
    }

    #[test]
    fn test_render_args() {
        assert_eq!(render_args(&[]), "[]");
        assert_eq!(render_args(&call_args!["str", 10]), "['str', 10]");
        assert_eq!(render_args(&call_args![[1, 2, 3]]), "[[1, 2, 3]]");
        assert_eq!(
            render_args(&call_args![[true, false, true]]),
            "[[true, false, true]]"
        );
    }

    #[test]
    fn test_call_args_macro() {
        let empty = call_args![];
        assert!(empty.is_empty());

        let args = call_args![0, "x", Value::Null,];
        assert_eq!(args.len(), 3);
        assert_eq!(args[2], Value::Null);
    }
}
