//! End-to-end tests for the retrieval engine
//!
//! Each test spins up an embedded mock extraction API and drives the real
//! pipeline against it: cache check, throttle slot, transport (including
//! its internal retry), decode, persist. The mock instruments request
//! counts, simultaneously open requests, and arrival times so pacing and
//! concurrency properties are observable from the outside.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use bytes::Bytes;
use pagevault::cache::CacheStore;
use pagevault::throttle::Throttle;
use pagevault::worker::{ExtractClient, FetchPool, HttpConfig};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Instrumentation shared between the mock API and the assertions
#[derive(Default)]
struct MockState {
    requests: AtomicU32,
    open: AtomicU32,
    max_open: AtomicU32,
    /// Remaining 503 responses for the `/flaky` page
    flaky_failures: AtomicU32,
    arrivals: Mutex<Vec<Instant>>,
}

/// Mock extraction endpoint: responds per target-URL suffix
async fn extract(State(state): State<Arc<MockState>>, Json(payload): Json<Value>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    state.arrivals.lock().await.push(Instant::now());

    let open = state.open.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_open.fetch_max(open, Ordering::SeqCst);

    let url = payload
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Hold the request open briefly so overlap is observable
    sleep(Duration::from_millis(50)).await;
    state.open.fetch_sub(1, Ordering::SeqCst);

    if url.ends_with("/hello") {
        return Json(json!({ "httpResponseBody": "aGVsbG8=" })).into_response();
    }
    if url.ends_with("/structured") {
        return Json(json!({
            "httpResponseBody": { "data": "aGVsbG8=" },
            "browserHtml": "<html>rendered</html>",
        }))
        .into_response();
    }
    if url.ends_with("/rendered") {
        return Json(json!({ "browserHtml": "<html>rendered</html>" })).into_response();
    }
    if url.ends_with("/mystery") {
        // successful call, but no recognizable body field
        return Json(json!({ "status": "ok", "echoData": null })).into_response();
    }
    if url.ends_with("/flaky") {
        if state.flaky_failures.load(Ordering::SeqCst) > 0 {
            state.flaky_failures.fetch_sub(1, Ordering::SeqCst);
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        return Json(json!({ "httpResponseBody": "Zmxha3k=" })).into_response();
    }
    if url.ends_with("/missing") {
        return (StatusCode::BAD_REQUEST, "no such page").into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

/// Start the embedded mock API on a random port
async fn start_mock_server(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/v1/extract", post(extract))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    sleep(Duration::from_millis(50)).await;

    format!("http://{}/v1/extract", bound_addr)
}

/// Test context holding the mock API and a shared cache
struct EngineContext {
    state: Arc<MockState>,
    cache: CacheStore,
    endpoint: String,
}

impl EngineContext {
    async fn setup() -> Self {
        let state = Arc::new(MockState::default());
        let endpoint = start_mock_server(Arc::clone(&state)).await;

        Self {
            state,
            cache: CacheStore::in_memory(),
            endpoint,
        }
    }

    /// Build a pool against the mock API with a fresh throttle
    fn pool(&self, concurrency: usize, min_interval: Duration) -> FetchPool {
        let http = HttpConfig {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            max_retries: 3,
            ..HttpConfig::default()
        };
        let client = ExtractClient::new(http, self.endpoint.clone(), "test-key").unwrap();
        let throttle = Throttle::new(min_interval, Duration::ZERO);

        FetchPool::new(client, throttle, self.cache.clone(), concurrency)
    }

    fn requests(&self) -> u32 {
        self.state.requests.load(Ordering::SeqCst)
    }
}

fn target(suffix: &str) -> String {
    format!("http://pages.test{suffix}")
}

/// The spec scenario: one decodable page, one unrecognizable envelope,
/// concurrency 2, half-second pacing.
#[tokio::test]
async fn test_end_to_end_mixed_outcomes() {
    let ctx = EngineContext::setup().await;

    let targets = vec![target("/hello"), target("/mystery")];
    let summary = ctx
        .pool(2, Duration::from_millis(500))
        .run(targets.clone())
        .await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);

    // the decodable page landed in the cache, decoded
    assert_eq!(
        ctx.cache.read(&targets[0]).await.unwrap(),
        Bytes::from_static(b"hello")
    );
    // the undecodable one left nothing behind
    assert!(!ctx.cache.has(&targets[1]).await.unwrap());

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].target, targets[1]);
    assert!(summary.failures[0].cause.contains("envelope"));

    // both sends were paced by the shared throttle
    let arrivals = ctx.state.arrivals.lock().await;
    assert_eq!(arrivals.len(), 2);
    assert!(arrivals[1].duration_since(arrivals[0]) >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_cache_idempotence() {
    let ctx = EngineContext::setup().await;

    let targets = vec![
        target("/hello"),
        target("/structured"),
        target("/rendered"),
    ];

    let first = ctx
        .pool(3, Duration::from_millis(1))
        .run(targets.clone())
        .await;
    assert_eq!(first.fetched, 3);
    assert_eq!(ctx.requests(), 3);

    // structured body wins over the rendered page it arrived with
    assert_eq!(
        ctx.cache.read(&targets[1]).await.unwrap(),
        Bytes::from_static(b"hello")
    );
    // rendered pages are stored as-is
    assert_eq!(
        ctx.cache.read(&targets[2]).await.unwrap(),
        Bytes::from_static(b"<html>rendered</html>")
    );

    // a second run over the populated cache does no network work
    let second = ctx
        .pool(3, Duration::from_millis(1))
        .run(targets.clone())
        .await;
    assert_eq!(second.skipped, 3);
    assert_eq!(second.fetched, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(ctx.requests(), 3);
}

#[tokio::test]
async fn test_concurrency_bound_is_respected() {
    let ctx = EngineContext::setup().await;

    let targets: Vec<String> = (0..8).map(|i| target(&format!("/{i}/hello"))).collect();

    let summary = ctx
        .pool(2, Duration::from_millis(1))
        .run(targets)
        .await;

    assert_eq!(summary.fetched, 8);
    assert_eq!(ctx.requests(), 8);
    assert!(ctx.state.max_open.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_failure_isolation() {
    let ctx = EngineContext::setup().await;

    let a = target("/a/hello");
    let b = target("/missing");
    let c = target("/c/hello");

    let summary = ctx
        .pool(3, Duration::from_millis(1))
        .run(vec![a.clone(), b.clone(), c.clone()])
        .await;

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.failed, 1);

    assert!(ctx.cache.has(&a).await.unwrap());
    assert!(ctx.cache.has(&c).await.unwrap());
    assert!(!ctx.cache.has(&b).await.unwrap());

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].target, b);
    assert!(summary.failures[0].cause.contains("400"));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let ctx = EngineContext::setup().await;
    ctx.state.flaky_failures.store(2, Ordering::SeqCst);

    let flaky = target("/flaky");
    let summary = ctx
        .pool(1, Duration::from_millis(1))
        .run(vec![flaky.clone()])
        .await;

    // two 503s, then success on the third attempt
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(ctx.requests(), 3);
    assert_eq!(
        ctx.cache.read(&flaky).await.unwrap(),
        Bytes::from_static(b"flaky")
    );
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let ctx = EngineContext::setup().await;

    let summary = ctx
        .pool(1, Duration::from_millis(1))
        .run(vec![target("/missing")])
        .await;

    assert_eq!(summary.failed, 1);
    assert_eq!(ctx.requests(), 1);
}
