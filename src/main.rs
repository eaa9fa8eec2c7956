//! News Sentiment Dashboard — Binary Entrypoint
//! Boots the Axum HTTP server: dashboard page, JSON API and `/metrics`.

use anyhow::Context;
use news_sentiment_dashboard::{api, logging, metrics::Metrics, AppConfig, AppState};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    if !logging::init_tracing() {
        tracing::warn!("tracing subscriber already installed; RUST_LOG/LOG_FORMAT defaults not applied");
    }

    let cfg = AppConfig::load_default().context("loading dashboard config")?;
    if cfg.uses_placeholder_key() {
        tracing::warn!("NEWSAPI_KEY not set; fetches will be rejected upstream");
    }

    let metrics = Metrics::init(&cfg);

    // Creates the prediction directory if absent.
    let mut state = AppState::from_config(cfg).context("initializing app state")?;
    if let Ok(dir) = std::env::var("STATIC_DIR") {
        state = state.with_static_dir(dir);
    }
    tracing::info!(
        pred_dir = %state.config().pred_dir.display(),
        max_files = state.config().max_files,
        "dashboard ready"
    );

    let mut router = api::create_router(state);
    match metrics {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
