//! # rest-client
//!
//! An async JSON REST client with a pluggable, register-once metrics seam.
//!
//! ## Architecture
//!
//! 1. **Metrics** — four recorder slots (latency, result, throttle,
//!    throttle latency), no-op until `metrics::register` is called once
//!    (always available, no feature needed)
//! 2. **HTTP** — `HttpClient`: client-side token bucket, retry policies,
//!    and the calls into the metrics slots
//! 3. **Client** — `RestClient`: base URL, bearer token, typed verbs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rest_client::prelude::*;
//!
//! metrics::register(TracingMetrics::selection());
//!
//! let client = RestClient::builder()
//!     .base_url("https://api.example.com/v1")
//!     .qps(20.0)
//!     .burst(40)
//!     .build()?;
//!
//! let items: Vec<Item> = client.get("items").await?;
//! ```

// ── Core ─────────────────────────────────────────────────────────────────────

/// Metrics hook registry and the default recorders.
pub mod metrics;

/// Shared newtypes.
pub mod shared;

/// Client error types.
pub mod error;

/// Default client settings.
pub mod defaults;

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// Instrumented HTTP transport with throttling and retry policies.
#[cfg(feature = "http")]
pub mod http;

/// `RestClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Metrics seam
    pub use crate::metrics::{
        self, LatencyMetric, RegisterMetrics, ResultMetric, ThrottleLatencyMetric,
        ThrottleMetric, TracingMetrics,
    };

    // Shared newtypes
    pub use crate::shared::Verb;

    // Errors
    pub use crate::error::{Error, HttpError};

    // HTTP client
    #[cfg(feature = "http")]
    pub use crate::client::{RestClient, RestClientBuilder};
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
}
