//! Low-level HTTP transport — `HttpClient`.
//!
//! Verb-generic request execution with client-side throttling, retries and
//! the metrics hooks. Every attempt is throttled, timed and reported on its
//! own; `RestClient` wraps this with base-URL handling and convenience verbs.

use crate::error::HttpError;
use crate::http::rate_limit::RateLimiter;
use crate::http::retry::{parse_retry_after, RetryPolicy};
use crate::metrics;
use crate::shared::Verb;

use async_lock::RwLock;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Result code reported to the result metric when no response was received.
pub const ERROR_CODE: &str = "<error>";

/// Transport settings, filled in by `RestClientBuilder`.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub qps: f32,
    pub burst: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: crate::defaults::DEFAULT_TIMEOUT,
            user_agent: crate::defaults::DEFAULT_USER_AGENT.to_string(),
            qps: crate::defaults::DEFAULT_QPS,
            burst: crate::defaults::DEFAULT_BURST,
        }
    }
}

/// Low-level instrumented HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter,
    /// Bearer token injected on native targets. NEVER logged.
    auth_token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder
                .timeout(config.timeout)
                .user_agent(config.user_agent.as_str())
                .pool_max_idle_per_host(10);
        }

        Ok(Self {
            client: builder.build()?,
            rate_limiter: RateLimiter::new(config.qps, config.burst),
            auth_token: Arc::new(RwLock::new(None)),
        })
    }

    pub(crate) fn with_auth_token(self, token: Option<String>) -> Self {
        Self {
            auth_token: Arc::new(RwLock::new(token)),
            ..self
        }
    }

    pub(crate) async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    pub(crate) async fn has_auth_token(&self) -> bool {
        self.auth_token.read().await.is_some()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Execute a request, retrying per `retry`.
    pub async fn execute<T: DeserializeOwned, B: Serialize>(
        &self,
        verb: Verb,
        url: &Url,
        body: Option<&B>,
        retry: &RetryPolicy,
    ) -> Result<T, HttpError> {
        let Some(config) = retry.config() else {
            return self.do_request(verb, url, body).await;
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(verb, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => {
                            config.retryable_statuses.contains(status)
                        }
                        HttpError::RateLimited { .. } => config.retryable_statuses.contains(&429),
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            #[cfg(not(target_arch = "wasm32"))]
                            let retryable = re.is_connect() || re.is_request();
                            #[cfg(target_arch = "wasm32")]
                            let retryable = re.is_request();
                            retryable
                        }
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let mut delay = config.delay_for_attempt(attempt);
                        if let HttpError::RateLimited {
                            retry_after_ms: Some(ms),
                        } = &e
                        {
                            delay += Duration::from_millis(*ms).min(config.max_delay);
                        }
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            %verb,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else if should_retry {
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    /// Wait on the client-side limiter and report the wait.
    async fn throttle(&self, verb: Verb, url: &Url) {
        if self.rate_limiter.is_unlimited() {
            return;
        }

        let waited = self.rate_limiter.acquire().await;
        metrics::request_throttle_latency().observe(verb.as_str(), url, waited);
        if waited.is_zero() {
            return;
        }

        metrics::request_throttle().increment(verb.as_str(), url);
        if waited > crate::defaults::LONG_THROTTLE_LATENCY {
            tracing::warn!(
                waited_ms = waited.as_millis() as u64,
                %verb,
                "Waited for client-side throttling before request to {}",
                url
            );
        }
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        verb: Verb,
        url: &Url,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        self.throttle(verb, url).await;

        let mut req = self.client.request(verb.into(), url.clone());

        // Inject auth token on native
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(token) = self.auth_token.read().await.as_ref() {
                req = req.header(AUTHORIZATION, format!("Bearer {}", token));
            }
        }

        if let Some(b) = body {
            req = req.json(b);
        }

        let host = authority(url);
        let start = Instant::now();
        let sent = req.send().await;
        metrics::request_latency().observe(verb.as_str(), url, start.elapsed());

        let resp = match sent {
            Ok(resp) => {
                metrics::request_result().increment(resp.status().as_str(), verb.as_str(), &host);
                resp
            }
            Err(e) => {
                metrics::request_result().increment(ERROR_CODE, verb.as_str(), &host);
                if e.is_timeout() {
                    return Err(HttpError::Timeout);
                }
                return Err(e.into());
            }
        };

        let status = resp.status();
        tracing::trace!(%verb, status = status.as_u16(), "Completed request to {}", url);

        if status.is_success() {
            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                return Ok(serde_json::from_value(serde_json::Value::Null)?);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let status_code = status.as_u16();
        if status_code == 429 {
            metrics::request_throttle().increment(verb.as_str(), url);
            let retry_after_ms = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(retry_after_ms);
            return Err(HttpError::RateLimited { retry_after_ms });
        }

        let body_text = resp.text().await.unwrap_or_default();
        Err(status_error(status_code, body_text))
    }
}

/// `Retry-After` in milliseconds, saturating at `u64::MAX`.
fn retry_after_ms(value: &str) -> Option<u64> {
    parse_retry_after(value).map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Map a non-2xx, non-429 status to its error.
fn status_error(status: u16, body: String) -> HttpError {
    match status {
        401 => HttpError::Unauthorized,
        404 => HttpError::NotFound(body),
        400..=499 => HttpError::BadRequest(body),
        500..=599 => HttpError::ServerError { status, body },
        _ => HttpError::UnexpectedStatus { status, body },
    }
}

/// `host[:port]` of a URL, omitting the scheme's default port.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
