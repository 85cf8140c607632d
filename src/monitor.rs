//! Warning Monitor
//!
//! Background thread that warns about calls still running past their
//! threshold.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ register/remove ┌──────────────┐  snapshot  ┌────────────────┐
//! │ Interceptor  │────────────────▶│ CallRegistry │◀───────────│ WarningMonitor │
//! └──────────────┘                 └──────────────┘   remove   └───────┬────────┘
//!                                                                      │ warn_before
//!                                                                      ▼
//!                                                                 ┌─────────┐
//!                                                                 │  Sink   │
//!                                                                 └─────────┘
//! ```
//!
//! Each tick takes a snapshot of the registry. An overdue entry is removed
//! before it is logged, and only the sweep whose removal succeeded logs it.
//! A call therefore gets at most one `warn_before`, and none once its owner
//! has unregistered it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::registry::CallRegistry;
use crate::sink::Sink;
use crate::spec::LogLevel;
use crate::template::MessageFormatter;

/// Name of the monitor's thread
pub const THREAD_NAME: &str = "loggable-monitor";

// =============================================================================
// Configuration
// =============================================================================

/// Warning monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between two sweeps of the registry
    pub period: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
        }
    }
}

// =============================================================================
// Warning Monitor
// =============================================================================

/// Periodic sweeper of a [`CallRegistry`]
///
/// The sweep loop runs on its own OS thread, so instrumented calls that block
/// their thread (or every worker of an async runtime) are still warned about
/// while they run.
pub struct WarningMonitor {
    config: MonitorConfig,
    registry: Arc<CallRegistry>,
    formatter: Arc<MessageFormatter>,
    sink: Arc<dyn Sink>,

    /// Set once [`spawn`](Self::spawn) succeeded
    started: AtomicBool,

    /// Set by [`shutdown`](Self::shutdown)
    shutdown: AtomicBool,

    /// Wakes the loop early on shutdown
    wakeup: Mutex<()>,
    wakeup_cv: Condvar,

    /// Total `warn_before` messages emitted
    warnings: AtomicU64,
}

impl std::fmt::Debug for WarningMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarningMonitor")
            .field("config", &self.config)
            .field("active_calls", &self.registry.len())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl WarningMonitor {
    pub fn new(
        config: MonitorConfig,
        registry: Arc<CallRegistry>,
        formatter: Arc<MessageFormatter>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            config,
            registry,
            formatter,
            sink,
            started: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            wakeup: Mutex::new(()),
            wakeup_cv: Condvar::new(),
            warnings: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start the sweep loop on a dedicated thread.
    ///
    /// A monitor starts at most once; later calls fail with
    /// [`Error::MonitorAlreadyStarted`].
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::MonitorAlreadyStarted);
        }

        let monitor = Arc::clone(self);
        let spawned = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || monitor.run());

        spawned.map_err(|e| {
            self.started.store(false, Ordering::SeqCst);
            Error::Io(e)
        })
    }

    /// Run the sweep loop on the current thread until shut down
    #[instrument(skip(self))]
    pub fn run(self: Arc<Self>) {
        info!("Starting warning monitor with {:?}", self.config);

        let period = self.config.period.max(Duration::from_millis(1));
        let mut deadline = Instant::now() + period;

        loop {
            if self.wait_until(deadline) {
                info!("Warning monitor shutting down");
                break;
            }

            let now = Instant::now();
            let warned = self.sweep(now);
            if warned > 0 {
                debug!("Warned about {} slow calls", warned);
            }

            deadline += period;
            if deadline <= now {
                deadline = now + period;
            }
        }
    }

    /// Block until `deadline`; returns `true` if shut down meanwhile
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut guard = self.wakeup.lock();
        while !self.is_shutdown() {
            if self.wakeup_cv.wait_until(&mut guard, deadline).timed_out() {
                return self.is_shutdown();
            }
        }
        true
    }

    /// Warn about every registered call overdue as of `now`.
    ///
    /// Returns the number of warnings emitted.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut warned = 0;

        for call in self.registry.snapshot() {
            if !call.is_over(now) {
                continue;
            }
            // Lost the race to the owner or to another sweep
            if !self.registry.remove(call.id()) {
                continue;
            }

            let identity = call.identity();
            if self.sink.is_enabled(LogLevel::Warn, identity) {
                let message = self
                    .formatter
                    .warn_before(&call.context(), call.elapsed(now));
                self.sink.log(LogLevel::Warn, identity, &message);
                self.warnings.fetch_add(1, Ordering::Relaxed);
                warned += 1;
            }
        }

        warned
    }

    /// Signal shutdown and wake the loop
    pub fn shutdown(&self) {
        let _guard = self.wakeup.lock();
        self.shutdown.store(true, Ordering::SeqCst);
        self.wakeup_cv.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Total warnings emitted since creation
    pub fn warnings_emitted(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
