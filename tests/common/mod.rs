//! Shared helpers: a recording metrics implementation and a local API server.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use rest_client::metrics::{
    LatencyMetric, RegisterMetrics, ResultMetric, ThrottleLatencyMetric, ThrottleMetric,
};

// ─── Recorder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Latency { verb: String, url: String },
    Result { code: String, method: String, host: String },
    Throttle { verb: String, url: String },
    ThrottleLatency { verb: String, url: String, latency: Duration },
}

/// Records every hook call in arrival order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn selection(rec: &Arc<Self>) -> RegisterMetrics {
        RegisterMetrics {
            request_latency: Some(rec.clone()),
            request_result: Some(rec.clone()),
            request_throttle: Some(rec.clone()),
            request_throttle_latency: Some(rec.clone()),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Events about `url`, plus result events for its host.
    pub fn events_for(&self, url: &Url) -> Vec<Event> {
        let host = match url.port() {
            Some(port) => format!("{}:{}", url.host_str().unwrap(), port),
            None => url.host_str().unwrap().to_string(),
        };
        self.events()
            .into_iter()
            .filter(|e| match e {
                Event::Latency { url: u, .. }
                | Event::Throttle { url: u, .. }
                | Event::ThrottleLatency { url: u, .. } => u == url.as_str(),
                Event::Result { host: h, .. } => *h == host,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl LatencyMetric for Recorder {
    fn observe(&self, verb: &str, url: &Url, _latency: Duration) {
        self.push(Event::Latency {
            verb: verb.to_string(),
            url: url.to_string(),
        });
    }
}

impl ResultMetric for Recorder {
    fn increment(&self, code: &str, method: &str, host: &str) {
        self.push(Event::Result {
            code: code.to_string(),
            method: method.to_string(),
            host: host.to_string(),
        });
    }
}

impl ThrottleMetric for Recorder {
    fn increment(&self, verb: &str, url: &Url) {
        self.push(Event::Throttle {
            verb: verb.to_string(),
            url: url.to_string(),
        });
    }
}

impl ThrottleLatencyMetric for Recorder {
    fn observe(&self, verb: &str, url: &Url, latency: Duration) {
        self.push(Event::ThrottleLatency {
            verb: verb.to_string(),
            url: url.to_string(),
            latency,
        });
    }
}

// ─── Tagged ──────────────────────────────────────────────────────────────────

/// Writes `(tag, slot)` into a shared log; used to tell selections apart.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub tag: usize,
    pub log: Arc<Mutex<Vec<(usize, &'static str)>>>,
}

impl Tagged {
    fn note(&self, slot: &'static str) {
        self.log.lock().unwrap().push((self.tag, slot));
    }
}

impl LatencyMetric for Tagged {
    fn observe(&self, _: &str, _: &Url, _: Duration) {
        self.note("latency");
    }
}

impl ResultMetric for Tagged {
    fn increment(&self, _: &str, _: &str, _: &str) {
        self.note("result");
    }
}

impl ThrottleMetric for Tagged {
    fn increment(&self, _: &str, _: &Url) {
        self.note("throttle");
    }
}

impl ThrottleLatencyMetric for Tagged {
    fn observe(&self, _: &str, _: &Url, _: Duration) {
        self.note("throttle_latency");
    }
}

/// Call every slot once with dummy arguments.
pub fn touch_all_slots() {
    let url = Url::parse("http://localhost:1/touch").unwrap();
    rest_client::metrics::request_latency().observe("GET", &url, Duration::from_millis(1));
    rest_client::metrics::request_result().increment("200", "GET", "localhost:1");
    rest_client::metrics::request_throttle().increment("GET", &url);
    rest_client::metrics::request_throttle_latency().observe("GET", &url, Duration::ZERO);
}

// ─── Local API server ────────────────────────────────────────────────────────

async fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "no such item")
}

async fn throttled() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, "0")],
        "slow down",
    )
}

/// Per-server request counters for the stateful routes.
#[derive(Debug, Default)]
pub struct Hits {
    flaky: AtomicUsize,
    busy: AtomicUsize,
}

/// Fails with 503 twice, then succeeds.
async fn flaky(State(hits): State<Arc<Hits>>) -> Result<Json<Value>, StatusCode> {
    let n = hits.flaky.fetch_add(1, Ordering::SeqCst);
    if n < 2 {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    } else {
        Ok(Json(json!({ "attempt": n + 1 })))
    }
}

/// Answers 429 with `Retry-After: 1` once, then succeeds.
async fn busy(State(hits): State<Arc<Hits>>) -> Response {
    if hits.busy.fetch_add(1, Ordering::SeqCst) == 0 {
        (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "1")],
            "busy",
        )
            .into_response()
    } else {
        Json(json!({ "ok": true })).into_response()
    }
}

async fn cached() -> StatusCode {
    StatusCode::NOT_MODIFIED
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": auth }))
}

async fn gone() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub fn router() -> Router {
    Router::new()
        .route("/api/ok", get(ok))
        .route("/api/missing", get(missing))
        .route("/api/throttled", get(throttled))
        .route("/api/flaky", get(flaky))
        .route("/api/busy", get(busy))
        .route("/api/cached", get(cached))
        .route("/api/echo", post(echo).put(echo).patch(echo))
        .route("/api/whoami", get(whoami))
        .route("/api/items/7", delete(gone))
        .with_state(Arc::new(Hits::default()))
}

/// Serve `router()` on an ephemeral port; returns the `/api` base URL.
pub async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// A base URL nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
