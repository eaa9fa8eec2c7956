// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/settings
// - GET /api/dashboard (empty and populated)
// - POST /api/fetch (success, warning, error all answer 200; limit via query or JSON body)
// - GET / (static dashboard page)

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use news_sentiment_dashboard::ingest::providers::fixture::FixtureProvider;
use news_sentiment_dashboard::ingest::types::HeadlineProvider;
use news_sentiment_dashboard::sentiment::LexiconScorer;
use news_sentiment_dashboard::store::PredictionStore;
use news_sentiment_dashboard::{api, AppConfig, AppState, Headline};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests
const TOP: &str = include_str!("fixtures/newsapi_top_headlines.json");

/// Build the router the binary uses, with an offline provider and a temp store.
fn test_router(provider: Arc<dyn HeadlineProvider>) -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = AppConfig {
        pred_dir: dir.path().join("predictions"),
        ..AppConfig::default()
    };
    let store = PredictionStore::open(&cfg.pred_dir).expect("open store");
    let state = AppState::new(cfg, provider, Arc::new(LexiconScorer::new()), store);
    (dir, api::router(state))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn post_json_body(app: &Router, uri: &str, body: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("parse json"))
}

async fn send_json(app: &Router, method: &str, uri: &str) -> Json {
    let (status, bytes) = send(app, method, uri).await;
    assert!(status.is_success(), "{method} {uri} should be 2xx, got {status}");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));
    let (status, bytes) = send(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK, "health should be 200");
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn settings_expose_slider_ranges() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));
    let v = send_json(&app, "GET", "/api/settings").await;

    assert_eq!(v["refresh_interval"]["min"], 10);
    assert_eq!(v["refresh_interval"]["max"], 120);
    assert_eq!(v["refresh_interval"]["default"], 30);
    assert_eq!(v["fetch_limit"]["min"], 5);
    assert_eq!(v["fetch_limit"]["max"], 50);
    assert_eq!(v["fetch_limit"]["default"], 20);
}

#[tokio::test]
async fn empty_store_renders_empty_dashboard() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));
    let v = send_json(&app, "GET", "/api/dashboard").await;

    assert_eq!(v["empty"], true);
    assert_eq!(v["summary"]["total"], 0);
    assert_eq!(v["rows"].as_array().unwrap().len(), 0);
    assert!(v.get("distribution").is_some(), "missing 'distribution'");
    assert!(v.get("trend").is_some(), "missing 'trend'");
    assert!(v.get("generated_at").is_some(), "missing 'generated_at'");
}

#[tokio::test]
async fn fetch_then_dashboard_shows_counts() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));

    let status = send_json(&app, "POST", "/api/fetch?limit=20").await;
    assert_eq!(status["level"], "success");
    assert_eq!(status["processed"], 4);
    assert_eq!(status["message"], "✅ Processed 4 headlines");

    let v = send_json(&app, "GET", "/api/dashboard").await;
    assert_eq!(v["empty"], false);
    assert_eq!(v["summary"]["total"], 4);
    assert_eq!(v["summary"]["positive"], 2);
    assert_eq!(v["summary"]["negative"], 1);
    assert_eq!(v["summary"]["neutral"], 1);
    assert_eq!(v["distribution"][0]["sentiment"], "Positive");
    assert_eq!(v["distribution"][0]["count"], 2);

    // Fetching the same headlines again must not duplicate them on display.
    send_json(&app, "POST", "/api/fetch").await;
    let again = send_json(&app, "GET", "/api/dashboard").await;
    // Records without a URL get a fresh id per fetch, so only that one repeats.
    assert_eq!(again["summary"]["total"], 5);

    let recs = send_json(&app, "GET", "/api/records?n=2").await;
    assert_eq!(recs.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn fetch_limit_is_clamped_to_slider_range() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));
    // 1 is below the minimum of 5; the fixture has only 4 valid items.
    let status = send_json(&app, "POST", "/api/fetch?limit=1").await;
    assert_eq!(status["processed"], 4);
}

#[tokio::test]
async fn upstream_failure_is_reported_not_raised() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::failing("connection timed out")));

    let status = send_json(&app, "POST", "/api/fetch").await;
    assert_eq!(status["level"], "error");
    assert_eq!(status["processed"], 0);
    assert!(status["message"]
        .as_str()
        .unwrap()
        .contains("connection timed out"));

    let v = send_json(&app, "GET", "/api/dashboard").await;
    assert_eq!(v["empty"], true);
}

#[tokio::test]
async fn root_serves_dashboard_page() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));
    let (status, bytes) = send(&app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("News Sentiment Dashboard"));
}

/// Remembers the limit it was asked for and returns one headline.
#[derive(Default)]
struct LimitRecorder {
    seen: AtomicU32,
}

#[async_trait]
impl HeadlineProvider for LimitRecorder {
    async fn fetch_top_headlines(&self, limit: u32) -> anyhow::Result<Vec<Headline>> {
        self.seen.store(limit, Ordering::SeqCst);
        Ok(vec![Headline {
            id: format!("https://example.test/limit/{limit}"),
            source: "Wire".into(),
            title: "Markets steady".into(),
            published_at: "2025-06-01T08:00:00Z".into(),
        }])
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn malformed_limit_falls_back_to_slider_default() {
    let provider = Arc::new(LimitRecorder::default());
    let (_dir, app) = test_router(provider.clone());

    let (status, bytes) = send(&app, "POST", "/api/fetch?limit=abc").await;
    assert_eq!(status, StatusCode::OK, "bad limit must not reject the request");
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["level"], "success");
    assert_eq!(provider.seen.load(Ordering::SeqCst), 20);

    let (status, _) = post_json_body(&app, "/api/fetch", r#"{"limit":"lots"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.seen.load(Ordering::SeqCst), 20);

    let (status, _) = post_json_body(&app, "/api/fetch", "not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.seen.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn fetch_limit_read_from_json_body_or_query() {
    let provider = Arc::new(LimitRecorder::default());
    let (_dir, app) = test_router(provider.clone());

    let (status, v) = post_json_body(&app, "/api/fetch", r#"{"limit":7}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["processed"], 1);
    assert_eq!(provider.seen.load(Ordering::SeqCst), 7);

    let (_, _) = post_json_body(&app, "/api/fetch", r#"{"limit":1000}"#).await;
    assert_eq!(provider.seen.load(Ordering::SeqCst), 50);

    send_json(&app, "POST", "/api/fetch?limit=12").await;
    assert_eq!(provider.seen.load(Ordering::SeqCst), 12);

    // Body wins when both are present.
    let (_, _) = post_json_body(&app, "/api/fetch?limit=12", r#"{"limit":9}"#).await;
    assert_eq!(provider.seen.load(Ordering::SeqCst), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_fetches_each_persist_a_batch() {
    let (_dir, app) = test_router(Arc::new(FixtureProvider::from_fixture(TOP)));

    let (a, b, c) = tokio::join!(
        send_json(&app, "POST", "/api/fetch"),
        send_json(&app, "POST", "/api/fetch"),
        send_json(&app, "POST", "/api/fetch"),
    );
    for s in [a, b, c] {
        assert_eq!(s["processed"], 4);
    }

    // Three URL-keyed headlines dedup; the URL-less one gets a new id per fetch.
    let v = send_json(&app, "GET", "/api/dashboard").await;
    assert_eq!(v["summary"]["total"], 6);
}
