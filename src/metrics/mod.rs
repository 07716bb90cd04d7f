//! Metrics hook registry — the seam between the HTTP client and whatever
//! metrics backend the application uses.
//!
//! The client reports four things: per-request latency, result codes,
//! throttling events and time spent throttled. Each is a separate trait so a
//! consumer can supply any subset. Nothing is recorded until [`register`] is
//! called; until then every slot is a no-op.
//!
//! Registration happens at most once per process. The first call wins, later
//! calls are silently ignored.
//!
//! ```rust,ignore
//! use rest_client::metrics::{self, RegisterMetrics};
//!
//! metrics::register(
//!     RegisterMetrics::default()
//!         .with_request_latency(MyHistogram::new())
//!         .with_request_result(MyCounter::new()),
//! );
//! ```

pub mod log;

pub use self::log::TracingMetrics;

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

// ─── Capabilities ────────────────────────────────────────────────────────────

/// Observes client latency partitioned by verb and URL.
pub trait LatencyMetric: Send + Sync {
    fn observe(&self, verb: &str, url: &Url, latency: Duration);
}

/// Counts response codes partitioned by method and host.
pub trait ResultMetric: Send + Sync {
    fn increment(&self, code: &str, method: &str, host: &str);
}

/// Counts requests that were throttled.
pub trait ThrottleMetric: Send + Sync {
    fn increment(&self, verb: &str, url: &Url);
}

/// Observes client latency introduced by throttling.
pub trait ThrottleLatencyMetric: Send + Sync {
    fn observe(&self, verb: &str, url: &Url, latency: Duration);
}

// ─── Registration request ────────────────────────────────────────────────────

/// A partial set of recorders to install. `None` leaves the slot unchanged.
#[derive(Clone, Default)]
pub struct RegisterMetrics {
    pub request_latency: Option<Arc<dyn LatencyMetric>>,
    pub request_result: Option<Arc<dyn ResultMetric>>,
    pub request_throttle: Option<Arc<dyn ThrottleMetric>>,
    pub request_throttle_latency: Option<Arc<dyn ThrottleLatencyMetric>>,
}

impl RegisterMetrics {
    pub fn with_request_latency(mut self, metric: impl LatencyMetric + 'static) -> Self {
        self.request_latency = Some(Arc::new(metric));
        self
    }

    pub fn with_request_result(mut self, metric: impl ResultMetric + 'static) -> Self {
        self.request_result = Some(Arc::new(metric));
        self
    }

    pub fn with_request_throttle(mut self, metric: impl ThrottleMetric + 'static) -> Self {
        self.request_throttle = Some(Arc::new(metric));
        self
    }

    pub fn with_request_throttle_latency(
        mut self,
        metric: impl ThrottleLatencyMetric + 'static,
    ) -> Self {
        self.request_throttle_latency = Some(Arc::new(metric));
        self
    }
}

impl fmt::Debug for RegisterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterMetrics")
            .field("request_latency", &self.request_latency.is_some())
            .field("request_result", &self.request_result.is_some())
            .field("request_throttle", &self.request_throttle.is_some())
            .field(
                "request_throttle_latency",
                &self.request_throttle_latency.is_some(),
            )
            .finish()
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The fully resolved slot set. Published in one step, so readers never see a
/// mix of defaults and registered recorders from different calls.
struct Registered {
    latency: Arc<dyn LatencyMetric>,
    result: Arc<dyn ResultMetric>,
    throttle: Arc<dyn ThrottleMetric>,
    throttle_latency: Arc<dyn ThrottleLatencyMetric>,
}

static REGISTERED: OnceLock<Registered> = OnceLock::new();

/// Registers metrics for the HTTP client to use.
///
/// Only the first call in a process has any effect; every later call is a
/// silent no-op. Within that first call, each `Some` field replaces the
/// corresponding no-op default.
pub fn register(selection: RegisterMetrics) {
    REGISTERED.get_or_init(|| Registered {
        latency: selection
            .request_latency
            .unwrap_or_else(|| Arc::new(NoopLatency)),
        result: selection
            .request_result
            .unwrap_or_else(|| Arc::new(NoopResult)),
        throttle: selection
            .request_throttle
            .unwrap_or_else(|| Arc::new(NoopThrottle)),
        throttle_latency: selection
            .request_throttle_latency
            .unwrap_or_else(|| Arc::new(NoopThrottleLatency)),
    });
}

/// Whether [`register`] has already run in this process.
pub fn is_registered() -> bool {
    REGISTERED.get().is_some()
}

/// The latency metric that the HTTP client updates.
pub fn request_latency() -> &'static dyn LatencyMetric {
    match REGISTERED.get() {
        Some(r) => r.latency.as_ref(),
        None => &NoopLatency,
    }
}

/// The result metric that the HTTP client updates.
pub fn request_result() -> &'static dyn ResultMetric {
    match REGISTERED.get() {
        Some(r) => r.result.as_ref(),
        None => &NoopResult,
    }
}

/// The throttling metric that the HTTP client updates.
pub fn request_throttle() -> &'static dyn ThrottleMetric {
    match REGISTERED.get() {
        Some(r) => r.throttle.as_ref(),
        None => &NoopThrottle,
    }
}

/// The throttling latency metric that the HTTP client updates.
pub fn request_throttle_latency() -> &'static dyn ThrottleLatencyMetric {
    match REGISTERED.get() {
        Some(r) => r.throttle_latency.as_ref(),
        None => &NoopThrottleLatency,
    }
}

// ─── No-op defaults ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLatency;

impl LatencyMetric for NoopLatency {
    fn observe(&self, _: &str, _: &Url, _: Duration) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResult;

impl ResultMetric for NoopResult {
    fn increment(&self, _: &str, _: &str, _: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopThrottle;

impl ThrottleMetric for NoopThrottle {
    fn increment(&self, _: &str, _: &Url) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopThrottleLatency;

impl ThrottleLatencyMetric for NoopThrottleLatency {
    fn observe(&self, _: &str, _: &Url, _: Duration) {}
}
