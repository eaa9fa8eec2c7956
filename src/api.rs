use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::AppConfig;
use crate::dashboard::{DashboardView, Settings};
use crate::ingest::{self, providers::newsapi::NewsApiProvider, types::HeadlineProvider, FetchStatus};
use crate::record::HeadlineRecord;
use crate::sentiment::{LexiconScorer, PolarityScorer};
use crate::store::PredictionStore;

pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    provider: Arc<dyn HeadlineProvider>,
    scorer: Arc<dyn PolarityScorer>,
    store: Arc<PredictionStore>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn HeadlineProvider>,
        scorer: Arc<dyn PolarityScorer>,
        store: PredictionStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            scorer,
            store: Arc::new(store),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }

    /// Live wiring: NewsAPI provider, lexicon scorer, store at `pred_dir`
    /// (created if absent).
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let provider = NewsApiProvider::from_config(&config)?;
        let store = PredictionStore::open(&config.pred_dir)?.with_max_files(config.max_files);
        Ok(Self::new(
            config,
            Arc::new(provider),
            Arc::new(LexiconScorer::new()),
            store,
        ))
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/settings", get(settings))
        .route("/api/fetch", post(fetch))
        .route("/api/dashboard", get(dashboard))
        .route("/api/records", get(records))
        .fallback_service(static_files)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Alias kept for callers that prefer `api::router`.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

async fn settings(State(state): State<AppState>) -> Json<Settings> {
    Json(Settings::from_config(&state.config))
}

#[derive(Debug, serde::Deserialize)]
struct FetchParams {
    #[serde(default)]
    limit: Option<serde_json::Value>,
}

impl FetchParams {
    /// Numbers and numeric strings are accepted; anything else means "use the default".
    fn limit(&self) -> Option<u32> {
        match self.limit.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64().map(|v| u32::try_from(v).unwrap_or(u32::MAX)),
            serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        }
    }
}

/// Limit from a JSON body `{"limit": N}`, else from `?limit=N`.
fn requested_limit(query: Result<Query<FetchParams>, QueryRejection>, body: &[u8]) -> Option<u32> {
    let from_body = serde_json::from_slice::<FetchParams>(body)
        .ok()
        .and_then(|p| p.limit());
    from_body.or_else(|| query.ok().and_then(|Query(q)| q.limit()))
}

/// Always 200: failures are reported in the status body so the page keeps rendering.
/// A malformed limit falls back to the slider default instead of rejecting the request.
async fn fetch(
    State(state): State<AppState>,
    query: Result<Query<FetchParams>, QueryRejection>,
    body: Bytes,
) -> Json<FetchStatus> {
    let limit = state.config.fetch_limit.clamp(requested_limit(query, &body));
    let outcome = ingest::run_once(
        state.provider.as_ref(),
        state.scorer.as_ref(),
        &state.store,
        limit,
    )
    .await;
    Json(outcome.status())
}

#[derive(Debug, serde::Deserialize)]
struct LoadParams {
    #[serde(default)]
    n: Option<usize>,
}

/// Scans up to `max_files` batch files, so it runs on the blocking pool.
async fn load(state: &AppState, n: Option<usize>) -> Vec<HeadlineRecord> {
    let n = n.unwrap_or(state.config.load_limit);
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || store.load_recent(n)).await {
        Ok(recs) => recs,
        Err(e) => {
            tracing::warn!(target: "store", error = %e, "load task failed");
            Vec::new()
        }
    }
}

async fn dashboard(State(state): State<AppState>, Query(q): Query<LoadParams>) -> Json<DashboardView> {
    let recs = load(&state, q.n).await;
    Json(DashboardView::build(
        &recs,
        Settings::from_config(&state.config),
        chrono::Utc::now(),
    ))
}

async fn records(State(state): State<AppState>, Query(q): Query<LoadParams>) -> Json<Vec<HeadlineRecord>> {
    Json(load(&state, q.n).await)
}
