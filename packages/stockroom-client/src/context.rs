//! Request-scoped context passed to every collaborator call.
//!
//! Replaces ambient session and loading state: the caller decides which
//! token and which loading reporter a request uses.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives loading notifications for collaborator requests.
pub trait LoadingReporter: Send + Sync {
    /// A request started.
    fn begin(&self, operation: &str);
    /// A request finished, successfully or not.
    fn end(&self, operation: &str);
}

/// Reporter that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoading;

impl LoadingReporter for NoopLoading {
    fn begin(&self, _operation: &str) {}
    fn end(&self, _operation: &str) {}
}

/// Reporter counting in-flight and completed requests.
#[derive(Debug, Default)]
pub struct LoadingCounter {
    in_flight: AtomicUsize,
    completed: AtomicU64,
}

impl LoadingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Requests finished since creation.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Returns true while any request is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }
}

impl LoadingReporter for LoadingCounter {
    fn begin(&self, operation: &str) {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(operation, in_flight = now, "request started");
    }

    fn end(&self, operation: &str) {
        let now = self.in_flight.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        self.completed.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(operation, in_flight = now, "request finished");
    }
}

/// Token and loading reporter for one or more collaborator calls.
#[derive(Clone)]
pub struct RequestContext {
    token: Option<String>,
    loading: Arc<dyn LoadingReporter>,
}

impl RequestContext {
    /// Context without credentials or loading reporting.
    pub fn anonymous() -> Self {
        Self {
            token: None,
            loading: Arc::new(NoopLoading),
        }
    }

    /// Context authenticating with a bearer token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            loading: Arc::new(NoopLoading),
        }
    }

    /// Replaces the loading reporter.
    pub fn with_loading(mut self, loading: Arc<dyn LoadingReporter>) -> Self {
        self.loading = loading;
        self
    }

    /// Bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Reports `operation` as started until the returned guard drops.
    pub fn track<'a>(&'a self, operation: &'a str) -> LoadingGuard<'a> {
        self.loading.begin(operation);
        LoadingGuard {
            context: self,
            operation,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Ends a loading notification when dropped.
pub struct LoadingGuard<'a> {
    context: &'a RequestContext,
    operation: &'a str,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.context.loading.end(self.operation);
    }
}
