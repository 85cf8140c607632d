//! Call Interceptor
//!
//! Wraps one invocation of an instrumented function: times it, registers it
//! with the [`CallRegistry`] when slow-call warnings are on, and emits the
//! enter and terminal messages through the [`Sink`].
//!
//! ```
//! use std::sync::Arc;
//! use loggable::{CallSite, Interceptor, Invocation, LogLevel, LogSpec, MemorySink};
//!
//! const SITE: CallSite = CallSite::new("billing::Invoices", "total");
//!
//! let sink = Arc::new(MemorySink::new());
//! let interceptor = Interceptor::new(sink.clone());
//! let invocation = Invocation::new(SITE, Arc::new(LogSpec::new(LogLevel::Info)))
//!     .with_args(loggable::call_args![2, 3]);
//!
//! let total: Result<i32, std::io::Error> = interceptor.intercept(&invocation, || Ok(5));
//! assert_eq!(total.unwrap(), 5);
//! assert!(sink.messages()[0].starts_with("#total([2, 3]): 5 in "));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::classify::{matches, CallError};
use crate::monitor::{MonitorConfig, WarningMonitor};
use crate::registry::CallRegistry;
use crate::render::{ToValue, Value};
use crate::sink::{Identity, Sink};
use crate::spec::{CallSite, LogLevel, LogSpec};
use crate::template::{self, LoggerFormats, MessageContext, MessageFormatter};

// =============================================================================
// Invocation
// =============================================================================

/// One call of an instrumented function
#[derive(Debug, Clone)]
pub struct Invocation {
    site: CallSite,
    spec: Arc<LogSpec>,
    args: Arc<[Value]>,
}

impl Invocation {
    /// Invocation without arguments
    pub fn new(site: CallSite, spec: Arc<LogSpec>) -> Self {
        Self {
            site,
            spec,
            args: Arc::from(Vec::new()),
        }
    }

    /// Attach the captured arguments, see [`call_args!`](crate::call_args)
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Arc::from(args);
        self
    }

    pub fn site(&self) -> CallSite {
        self.site
    }

    pub fn spec(&self) -> &LogSpec {
        &self.spec
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Logger identity: [`LogSpec::name`] if set, the declaring type otherwise
    pub fn identity(&self) -> Identity {
        if self.spec.name.is_empty() {
            Identity::Type(self.site.declaring_type)
        } else {
            Identity::Name(self.spec.name.clone())
        }
    }

    fn context(&self) -> MessageContext<'_> {
        MessageContext::new(self.site.method, &self.args, &self.spec)
    }
}

// =============================================================================
// Registration Guard
// =============================================================================

/// Keeps a call registered while it runs
///
/// Dropping the guard unregisters the call, so a panicking call or a
/// cancelled future leaves nothing behind for the monitor.
struct Registration<'a> {
    registry: &'a CallRegistry,
    id: Option<u64>,
}

impl Registration<'_> {
    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.registry.remove(id);
        }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

// =============================================================================
// Interceptor
// =============================================================================

/// Logging wrapper around instrumented calls
#[derive(Clone)]
pub struct Interceptor {
    sink: Arc<dyn Sink>,
    formatter: Arc<MessageFormatter>,
    registry: Arc<CallRegistry>,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("formatter", &self.formatter)
            .field("active_calls", &self.registry.len())
            .finish()
    }
}

impl Interceptor {
    /// Interceptor using the process-wide formats
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self::with_formats(sink, template::current())
    }

    /// Interceptor using its own formats
    pub fn with_formats(sink: Arc<dyn Sink>, formats: Arc<LoggerFormats>) -> Self {
        Self {
            sink,
            formatter: Arc::new(MessageFormatter::new(formats)),
            registry: Arc::new(CallRegistry::new()),
        }
    }

    pub fn registry(&self) -> &Arc<CallRegistry> {
        &self.registry
    }

    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    /// Warning monitor sweeping this interceptor's registry.
    ///
    /// Start it with [`WarningMonitor::spawn`].
    pub fn monitor(&self, config: MonitorConfig) -> Arc<WarningMonitor> {
        Arc::new(WarningMonitor::new(
            config,
            Arc::clone(&self.registry),
            Arc::clone(&self.formatter),
            Arc::clone(&self.sink),
        ))
    }

    /// Run `invoke` and log it.
    ///
    /// The outcome is returned exactly as `invoke` produced it.
    pub fn intercept<T, E, F>(&self, invocation: &Invocation, invoke: F) -> Result<T, E>
    where
        T: ToValue,
        E: CallError + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let start = Instant::now();
        let mut registration = self.begin(invocation, start);

        let outcome = invoke();

        let elapsed = start.elapsed();
        registration.release();
        self.finish(invocation, &outcome, elapsed);
        outcome
    }

    /// Await `future` and log it, like [`intercept`](Self::intercept).
    ///
    /// Timing starts on first poll. Dropping the returned future before it
    /// completes unregisters the call without logging a terminal message.
    pub async fn intercept_async<T, E, Fut>(
        &self,
        invocation: &Invocation,
        future: Fut,
    ) -> Result<T, E>
    where
        T: ToValue,
        E: CallError + 'static,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut registration = self.begin(invocation, start);

        let outcome = future.await;

        let elapsed = start.elapsed();
        registration.release();
        self.finish(invocation, &outcome, elapsed);
        outcome
    }

    fn begin(&self, invocation: &Invocation, start: Instant) -> Registration<'_> {
        let spec = invocation.spec();
        let identity = invocation.identity();

        let id = (spec.warns() && self.sink.is_enabled(LogLevel::Warn, &identity)).then(|| {
            self.registry
                .register(
                    invocation.site,
                    Arc::clone(&invocation.spec),
                    Arc::clone(&invocation.args),
                    identity.clone(),
                    start,
                )
                .id()
        });

        if spec.entered {
            self.emit(spec, spec.level, &identity, || {
                self.formatter.enter(&invocation.context())
            });
        }

        Registration {
            registry: &self.registry,
            id,
        }
    }

    fn finish<T, E>(&self, invocation: &Invocation, outcome: &Result<T, E>, elapsed: Duration)
    where
        T: ToValue,
        E: CallError + 'static,
    {
        let spec = invocation.spec();
        let identity = invocation.identity();
        let ctx = invocation.context();

        match outcome {
            Ok(value) if spec.is_over(elapsed) => {
                self.emit(spec, LogLevel::Warn, &identity, || {
                    self.formatter.warn_after(&ctx, &value.to_value(), elapsed)
                });
            }
            Ok(value) => {
                self.emit(spec, spec.level, &identity, || {
                    self.formatter.after(&ctx, &value.to_value(), elapsed)
                });
            }
            Err(err) => {
                if spec.level == LogLevel::Off
                    || !self.sink.is_enabled(LogLevel::Error, &identity)
                {
                    return;
                }
                let message = self.formatter.error(&ctx, elapsed, err);
                if matches(&spec.ignore, err.error_type()) {
                    self.sink.log(LogLevel::Error, &identity, &message);
                } else {
                    self.sink
                        .log_error(LogLevel::Error, &identity, &message, err);
                }
            }
        }

        trace!("Intercepted {} in {:?}", invocation.site, elapsed);
    }

    /// Emit a message unless the call site is `Off` or the sink discards
    /// `level`; the message is only built when it will be written
    fn emit(
        &self,
        spec: &LogSpec,
        level: LogLevel,
        identity: &Identity,
        message: impl FnOnce() -> String,
    ) {
        if spec.level == LogLevel::Off || !self.sink.is_enabled(level, identity) {
            return;
        }
        self.sink.log(level, identity, &message());
    }
}

// =============================================================================
// Tests
// =============================================================================
