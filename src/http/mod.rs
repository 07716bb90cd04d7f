//! HTTP layer — `HttpClient` with client-side throttling, retry policies and
//! metrics hooks.

pub mod client;
pub mod rate_limit;
pub mod retry;

pub use client::{HttpClient, HttpConfig};
pub use rate_limit::RateLimiter;
pub use retry::{RetryConfig, RetryPolicy};
