//! `TracingMetrics` — a recorder that turns every hook call into a `tracing`
//! event. Useful when no real metrics backend is wired up yet.

use super::{
    LatencyMetric, RegisterMetrics, ResultMetric, ThrottleLatencyMetric, ThrottleMetric,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Emits one `DEBUG` event per observation on target `rest_client::metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl TracingMetrics {
    /// A registration request with all four slots pointing at one shared
    /// `TracingMetrics`.
    pub fn selection() -> RegisterMetrics {
        let shared = Arc::new(TracingMetrics);
        RegisterMetrics {
            request_latency: Some(shared.clone()),
            request_result: Some(shared.clone()),
            request_throttle: Some(shared.clone()),
            request_throttle_latency: Some(shared),
        }
    }
}

impl LatencyMetric for TracingMetrics {
    fn observe(&self, verb: &str, url: &Url, latency: Duration) {
        tracing::debug!(
            target: "rest_client::metrics",
            verb,
            url = %url,
            latency_ms = latency.as_millis() as u64,
            "request latency"
        );
    }
}

impl ResultMetric for TracingMetrics {
    fn increment(&self, code: &str, method: &str, host: &str) {
        tracing::debug!(
            target: "rest_client::metrics",
            code,
            method,
            host,
            "request result"
        );
    }
}

impl ThrottleMetric for TracingMetrics {
    fn increment(&self, verb: &str, url: &Url) {
        tracing::debug!(
            target: "rest_client::metrics",
            verb,
            url = %url,
            "request throttled"
        );
    }
}

impl ThrottleLatencyMetric for TracingMetrics {
    fn observe(&self, verb: &str, url: &Url, latency: Duration) {
        tracing::debug!(
            target: "rest_client::metrics",
            verb,
            url = %url,
            latency_ms = latency.as_millis() as u64,
            "throttle latency"
        );
    }
}
