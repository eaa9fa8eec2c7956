//! Runs one fetch-classify-persist cycle and prints the status line.
//!
//! Usage: `fetch_once [LIMIT]`. The limit is clamped to the configured
//! fetch-limit range. Exit code is 1 when the fetch failed.

use news_sentiment_dashboard::{
    ingest::{self, providers::newsapi::NewsApiProvider, StatusLevel},
    logging,
    sentiment::LexiconScorer,
    store::PredictionStore,
    AppConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = AppConfig::load_default()?;
    let limit = std::env::args().nth(1).and_then(|a| a.parse::<u32>().ok());
    let limit = cfg.fetch_limit.clamp(limit);

    let provider = NewsApiProvider::from_config(&cfg)?;
    let store = PredictionStore::open(&cfg.pred_dir)?.with_max_files(cfg.max_files);

    let outcome = ingest::run_once(&provider, &LexiconScorer::new(), &store, limit).await;
    let status = outcome.status();
    println!("{}", status.message);

    if status.level == StatusLevel::Error {
        std::process::exit(1);
    }
    Ok(())
}
