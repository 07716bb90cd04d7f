//! Client-side token bucket throttle.

use async_lock::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest wait a single reservation can ask for.
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Token bucket shared by every clone of a client.
///
/// Reservations may drive the bucket below zero; each caller then sleeps for
/// its own share of the deficit, so concurrent callers queue in arrival order.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    qps: f64,
    burst: f64,
    state: Option<Arc<Mutex<Bucket>>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

impl RateLimiter {
    /// `qps <= 0` or a non-finite `qps` disables throttling.
    pub fn new(qps: f32, burst: u32) -> Self {
        if !qps.is_finite() || qps <= 0.0 {
            return Self::unlimited();
        }
        Self {
            qps: qps as f64,
            burst: burst as f64,
            state: Some(Arc::new(Mutex::new(Bucket {
                tokens: burst as f64,
                last: Instant::now(),
            }))),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            qps: 0.0,
            burst: 0.0,
            state: None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.state.is_none()
    }

    /// Take one token and return how long the caller must wait before using it.
    pub async fn reserve(&self) -> Duration {
        let Some(state) = &self.state else {
            return Duration::ZERO;
        };

        let mut bucket = state.lock().await;
        let now = Instant::now();
        let refill = now.duration_since(bucket.last).as_secs_f64() * self.qps;
        bucket.tokens = (bucket.tokens + refill).min(self.burst);
        bucket.last = now;
        bucket.tokens -= 1.0;

        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(-bucket.tokens / self.qps)
                .unwrap_or(MAX_WAIT)
                .min(MAX_WAIT)
        }
    }

    /// Reserve a token and sleep until it may be used. Returns the time
    /// waited, or zero when a token was immediately available.
    pub async fn acquire(&self) -> Duration {
        let start = Instant::now();
        let wait = self.reserve().await;
        if wait.is_zero() {
            return Duration::ZERO;
        }
        futures_timer::Delay::new(wait).await;
        start.elapsed()
    }
}
