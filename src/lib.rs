//! Loggable - Call Interception Logging Engine
//!
//! Wraps calls of instrumented functions and logs how they went: arguments,
//! result or error, elapsed time, and a warning for calls that run past a
//! configurable threshold, both while they are still running and once they
//! return.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              Interceptor                             │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐    │
//! │  │    render    │───▶│   template   │───▶│        Sink          │    │
//! │  │  (arguments) │    │  (messages)  │    │ (tracing / memory)   │    │
//! │  └──────────────┘    └──────────────┘    └──────────────────────┘    │
//! │         ▲                   ▲                       ▲                │
//! │  ┌──────┴───────┐    ┌──────┴───────┐    ┌──────────┴───────────┐    │
//! │  │   classify   │    │ CallRegistry │◀───│    WarningMonitor    │    │
//! │  │  (ignore)    │    │ (in flight)  │    │  (periodic sweep)    │    │
//! │  └──────────────┘    └──────────────┘    └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`classify`] - Error type graph and ignore matching
//! - [`error`] - Error types
//! - [`interceptor`] - Timing and logging of one invocation
//! - [`monitor`] - Background warnings for calls still running
//! - [`registry`] - Calls currently in flight
//! - [`render`] - Argument and result rendering
//! - [`sink`] - Leveled log destinations
//! - [`spec`] - Per-call-site configuration
//! - [`template`] - Message templates and placeholder substitution

pub mod classify;
pub mod error;
pub mod interceptor;
pub mod monitor;
pub mod registry;
pub mod render;
pub mod sink;
pub mod spec;
pub mod template;

// Re-export commonly used types
pub use classify::{CallError, ErrorType, Origin};
pub use error::{Error, Result};
pub use interceptor::{Interceptor, Invocation};
pub use monitor::{MonitorConfig, WarningMonitor};
pub use registry::{ActiveCall, CallRegistry};
pub use render::{ToValue, Value};
pub use sink::{Identity, MemorySink, Sink, TracingSink};
pub use spec::{CallSite, LogLevel, LogSpec, WarnUnit};
pub use template::LoggerFormats;
