//! High-level client — `RestClient` and its builder.
//!
//! Resolves paths against a base URL, picks a retry policy per verb and
//! hands the request to the instrumented `HttpClient`.

use crate::error::Error;
use crate::http::{HttpClient, HttpConfig, RetryPolicy};
use crate::shared::Verb;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// The primary entry point: a JSON REST client bound to one base URL.
#[derive(Clone)]
pub struct RestClient {
    pub(crate) http: HttpClient,
    base_url: Url,
    /// Policy applied to idempotent verbs when the caller does not pick one.
    retry: RetryPolicy,
}

impl RestClient {
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `path` onto the base URL. A leading `/` is ignored so the base
    /// URL's own path prefix is kept.
    ///
    /// The result must stay under the base URL: absolute URLs to other
    /// origins and `..` segments climbing above the base path are rejected,
    /// since the bearer token goes out with every request.
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != self.base_url.origin()
            || !url.path().starts_with(self.base_url.path())
        {
            return Err(Error::Config(format!(
                "path {:?} resolves outside base URL {}",
                path, self.base_url
            )));
        }
        Ok(url)
    }

    /// Replace (or clear) the bearer token sent with every request.
    pub async fn set_bearer_token(&self, token: Option<String>) {
        self.http.set_auth_token(token).await;
    }

    pub async fn has_bearer_token(&self) -> bool {
        self.http.has_auth_token().await
    }

    // ── Verbs ────────────────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Verb::Get, path, None::<&()>, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Verb::Delete, path, None::<&()>, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(Verb::Post, path, Some(body), None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(Verb::Put, path, Some(body), None).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(Verb::Patch, path, Some(body), None).await
    }

    /// Send a request with an explicit verb and, optionally, retry policy.
    ///
    /// Without a policy, idempotent verbs use the client's default and
    /// `POST`/`PATCH` are sent exactly once.
    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&B>,
        retry: Option<RetryPolicy>,
    ) -> Result<T, Error> {
        let url = self.url_for(path)?;
        let retry = retry.unwrap_or_else(|| {
            if verb.is_idempotent() {
                self.retry.clone()
            } else {
                RetryPolicy::None
            }
        });
        Ok(self.http.execute(verb, &url, body, &retry).await?)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct RestClientBuilder {
    base_url: Option<String>,
    http: HttpConfig,
    bearer_token: Option<String>,
    retry: RetryPolicy,
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            http: HttpConfig::default(),
            bearer_token: None,
            retry: RetryPolicy::Idempotent,
        }
    }
}

impl RestClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Sustained client-side request rate. `0` disables client-side throttling.
    pub fn qps(mut self, qps: f32) -> Self {
        self.http.qps = qps;
        self
    }

    pub fn burst(mut self, burst: u32) -> Self {
        self.http.burst = burst;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.http.user_agent = user_agent.to_string();
        self
    }

    /// Pre-set the bearer token on construction.
    pub fn bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    /// Default retry policy for idempotent verbs.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn build(self) -> Result<RestClient, Error> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let mut base_url = Url::parse(&raw)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("not a base URL: {}", raw)));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        if !self.http.qps.is_finite() {
            return Err(Error::Config(format!("invalid qps: {}", self.http.qps)));
        }
        if self.http.qps > 0.0 && self.http.burst == 0 {
            return Err(Error::Config(
                "burst must be at least 1 when qps is set".to_string(),
            ));
        }

        let http = HttpClient::new(&self.http)?.with_auth_token(self.bearer_token);

        tracing::debug!(
            base_url = %base_url,
            qps = self.http.qps,
            burst = self.http.burst,
            "Built REST client"
        );

        Ok(RestClient {
            http,
            base_url,
            retry: self.retry,
        })
    }
}
