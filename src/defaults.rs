//! Default client settings.

use std::time::Duration;

/// Per-request timeout (native only; browsers enforce their own).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sustained client-side request rate.
pub const DEFAULT_QPS: f32 = 5.0;

/// Requests allowed back-to-back before client-side throttling kicks in.
pub const DEFAULT_BURST: u32 = 10;

/// `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("rest-client/", env!("CARGO_PKG_VERSION"));

/// Client-side throttling above this is logged at `WARN`.
pub const LONG_THROTTLE_LATENCY: Duration = Duration::from_millis(50);
