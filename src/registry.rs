//! Active Call Registry
//!
//! Calls whose spec enables slow-call warnings are registered here for as
//! long as they run. The [`WarningMonitor`](crate::monitor::WarningMonitor)
//! scans the registry; whoever removes an entry first owns it, so an entry is
//! warned about at most once and never after its call finished.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::trace;

use crate::render::Value;
use crate::sink::Identity;
use crate::spec::{CallSite, LogSpec};
use crate::template::MessageContext;

// =============================================================================
// Active Call
// =============================================================================

/// A running call being watched for slowness
#[derive(Debug)]
pub struct ActiveCall {
    id: u64,
    site: CallSite,
    spec: Arc<LogSpec>,
    args: Arc<[Value]>,
    identity: Identity,
    start: Instant,
}

impl ActiveCall {
    pub fn id(&self) -> u64 {
        self.id
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

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// Time the call has been running as of `now`
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    /// Whether the call has run past its threshold as of `now`
    pub fn is_over(&self, now: Instant) -> bool {
        self.spec.is_over(self.elapsed(now))
    }

    pub fn context(&self) -> MessageContext<'_> {
        MessageContext::new(self.site.method, &self.args, &self.spec)
    }
}

// =============================================================================
// Call Registry
// =============================================================================

/// Concurrent set of running calls, keyed by a per-registry id
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: DashMap<u64, Arc<ActiveCall>>,
    next_id: AtomicU64,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call that started at `start` and return its entry
    pub fn register(
        &self,
        site: CallSite,
        spec: Arc<LogSpec>,
        args: Arc<[Value]>,
        identity: Identity,
        start: Instant,
    ) -> Arc<ActiveCall> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let call = Arc::new(ActiveCall {
            id,
            site,
            spec,
            args,
            identity,
            start,
        });

        self.calls.insert(id, Arc::clone(&call));
        trace!("Registered call {} ({})", id, site);
        call
    }

    /// Remove an entry.
    ///
    /// Returns `true` only for the caller that actually removed it; removing
    /// an absent entry is a no-op.
    pub fn remove(&self, id: u64) -> bool {
        let removed = self.calls.remove(&id).is_some();
        if removed {
            trace!("Unregistered call {}", id);
        }
        removed
    }

    pub fn contains(&self, id: u64) -> bool {
        self.calls.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Point-in-time copy of the registered calls
    pub fn snapshot(&self) -> Vec<Arc<ActiveCall>> {
        self.calls
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
