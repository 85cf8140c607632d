//! Exception Classifier
//!
//! Decides whether an error returned by an instrumented call belongs to the
//! call site's `ignore` set. Error types form a static graph declared with
//! `const fn`s: every [`ErrorType`] has at most one parent and any number of
//! capability tags ("interfaces"). An error matches an ignored type when its
//! own type is that type or reaches it through parents or capabilities.
//!
//! ```
//! use loggable::classify::{ErrorType, matches};
//!
//! static BASE: ErrorType = ErrorType::root("app::Base");
//! static MID: ErrorType = ErrorType::extends("app::Mid", &BASE);
//! static LEAF: ErrorType = ErrorType::extends("app::Leaf", &MID);
//!
//! assert!(matches(&[&MID], &LEAF));
//! assert!(!matches(&[&MID], &BASE));
//! ```

use std::panic::Location;

// =============================================================================
// Error Type Graph
// =============================================================================

/// Node in the static error type graph
#[derive(Debug)]
pub struct ErrorType {
    name: &'static str,
    parent: Option<&'static ErrorType>,
    capabilities: &'static [&'static ErrorType],
}

impl ErrorType {
    /// A type with no parent
    pub const fn root(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            capabilities: &[],
        }
    }

    /// A subtype of `parent`
    pub const fn extends(name: &'static str, parent: &'static ErrorType) -> Self {
        Self {
            name,
            parent: Some(parent),
            capabilities: &[],
        }
    }

    /// Attach capability tags this type directly implements
    pub const fn implementing(mut self, capabilities: &'static [&'static ErrorType]) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Fully qualified name, used as `error.class.name`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ErrorType> {
        self.parent
    }

    pub fn capabilities(&self) -> &'static [&'static ErrorType] {
        self.capabilities
    }

    /// Whether `self` is `ancestor` or one of its transitive subtypes.
    ///
    /// Checks the type itself, then its parent chain, then each capability
    /// it implements directly.
    pub fn is_a(&self, ancestor: &ErrorType) -> bool {
        if self == ancestor {
            return true;
        }
        if let Some(parent) = self.parent {
            if parent.is_a(ancestor) {
                return true;
            }
        }
        self.capabilities
            .iter()
            .any(|capability| capability.is_a(ancestor))
    }
}

/// Types are identified by name
impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ErrorType {}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Whether `error_type` belongs to any type in `ignore`
pub fn matches(ignore: &[&'static ErrorType], error_type: &ErrorType) -> bool {
    ignore.iter().any(|ignored| error_type.is_a(ignored))
}

// =============================================================================
// Built-in Types
// =============================================================================

/// Root of every error type; ignoring it ignores everything
pub static ERROR: ErrorType = ErrorType::root("std::error::Error");

/// `std::io::Error` of any kind
pub static IO_ERROR: ErrorType = ErrorType::extends("std::io::Error", &ERROR);

/// `std::io::Error` of kind `NotFound`
pub static FILE_NOT_FOUND: ErrorType =
    ErrorType::extends("std::io::ErrorKind::NotFound", &IO_ERROR);

/// `std::io::Error` of kind `PermissionDenied`
pub static PERMISSION_DENIED: ErrorType =
    ErrorType::extends("std::io::ErrorKind::PermissionDenied", &IO_ERROR);

/// `std::io::Error` of kind `TimedOut`
pub static TIMED_OUT: ErrorType = ErrorType::extends("std::io::ErrorKind::TimedOut", &IO_ERROR);

// =============================================================================
// Call Errors
// =============================================================================

/// Where an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// Source file (or module path) of the raising code
    pub source: &'static str,
    /// Line in `source`
    pub line: u32,
}

impl Origin {
    pub const fn new(source: &'static str, line: u32) -> Self {
        Self { source, line }
    }

    /// Origin of the caller of the function this is called from
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            source: location.file(),
            line: location.line(),
        }
    }
}

/// Errors an instrumented call may return
///
/// Every method has a default, so `impl CallError for MyError {}` is enough
/// for an error that should classify as the root [`ERROR`] type.
pub trait CallError: std::error::Error {
    /// Position in the error type graph
    fn error_type(&self) -> &'static ErrorType {
        &ERROR
    }

    /// Name rendered as `error.class.name`
    fn class_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Where the error was raised, if known
    fn origin(&self) -> Option<Origin> {
        None
    }
}

impl CallError for std::io::Error {
    fn error_type(&self) -> &'static ErrorType {
        match self.kind() {
            std::io::ErrorKind::NotFound => &FILE_NOT_FOUND,
            std::io::ErrorKind::PermissionDenied => &PERMISSION_DENIED,
            std::io::ErrorKind::TimedOut => &TIMED_OUT,
            _ => &IO_ERROR,
        }
    }

    fn class_name(&self) -> &'static str {
        self.error_type().name()
    }
}

// =============================================================================
// Tests
// =============================================================================
