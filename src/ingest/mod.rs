// src/ingest/mod.rs
//! Fetch → classify → persist, once per user request.

pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::PathBuf;

use crate::ingest::types::HeadlineProvider;
use crate::sentiment::{classify_batch, PolarityScorer};
use crate::store::PredictionStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Fetch-classify-persist runs.");
        describe_counter!(
            "ingest_headlines_total",
            "Headlines classified and persisted."
        );
        describe_counter!(
            "ingest_empty_total",
            "Runs that produced no valid headline."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!(
            "sentiment_scoring_failures_total",
            "Titles that fell back to the neutral default."
        );
        describe_counter!("store_batches_written_total", "Batch files written.");
        describe_counter!(
            "store_files_skipped_total",
            "Batch files skipped while loading."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
        describe_histogram!("ingest_parse_ms", "Response parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingest last ran.");
    });
}

/// Severity of the message shown to the user after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Success,
    Warning,
    Error,
}

/// User-facing result of a fetch request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchStatus {
    pub level: StatusLevel,
    pub message: String,
    pub processed: usize,
}

/// What one run did.
#[derive(Debug)]
pub enum FetchOutcome {
    /// `count` records written to `file`.
    Processed { count: usize, file: PathBuf },
    /// Upstream returned no valid headline; nothing was written.
    Empty,
    /// Fetch or persist failed; nothing usable was written.
    Failed { message: String },
}

impl FetchOutcome {
    pub fn status(&self) -> FetchStatus {
        match self {
            FetchOutcome::Processed { count, .. } => FetchStatus {
                level: StatusLevel::Success,
                message: format!("✅ Processed {count} headlines"),
                processed: *count,
            },
            FetchOutcome::Empty => FetchStatus {
                level: StatusLevel::Warning,
                message: "⚠️ No headlines fetched".to_string(),
                processed: 0,
            },
            FetchOutcome::Failed { message } => FetchStatus {
                level: StatusLevel::Error,
                message: message.clone(),
                processed: 0,
            },
        }
    }
}

/// Run one fetch-classify-persist cycle. Never returns an error: failures
/// become [`FetchOutcome::Failed`] and an empty batch writes no file.
pub async fn run_once(
    provider: &dyn HeadlineProvider,
    scorer: &dyn PolarityScorer,
    store: &PredictionStore,
    limit: u32,
) -> FetchOutcome {
    ensure_metrics_described();
    counter!("ingest_runs_total").increment(1);
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("ingest_last_run_ts").set(now as f64);

    let t0 = std::time::Instant::now();
    let fetched = provider.fetch_top_headlines(limit).await;
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let headlines = match fetched {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "ingest", error = ?e, provider = provider.name(), "provider error");
            counter!("ingest_provider_errors_total").increment(1);
            return FetchOutcome::Failed {
                message: format!("{} error: {e:#}", provider.name()),
            };
        }
    };

    if headlines.is_empty() {
        counter!("ingest_empty_total").increment(1);
        tracing::info!(target: "ingest", provider = provider.name(), "no valid headlines");
        return FetchOutcome::Empty;
    }

    let records = classify_batch(scorer, headlines);
    let count = records.len();
    // File IO stays off the async workers.
    let writer = store.clone();
    let written = tokio::task::spawn_blocking(move || writer.write_batch(&records))
        .await
        .unwrap_or_else(|e| Err(anyhow::anyhow!("batch writer task: {e}")));
    match written {
        Ok(file) => {
            counter!("ingest_headlines_total").increment(count as u64);
            tracing::info!(
                target: "ingest",
                kept = count,
                provider = provider.name(),
                scorer = scorer.name(),
                "batch processed"
            );
            FetchOutcome::Processed { count, file }
        }
        Err(e) => {
            tracing::warn!(target: "ingest", error = ?e, "persisting batch failed");
            FetchOutcome::Failed {
                message: format!("❌ Failed to persist headlines: {e:#}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_match_outcome() {
        let ok = FetchOutcome::Processed {
            count: 3,
            file: PathBuf::from("x.json"),
        }
        .status();
        assert_eq!(ok.level, StatusLevel::Success);
        assert_eq!(ok.message, "✅ Processed 3 headlines");
        assert_eq!(ok.processed, 3);

        let empty = FetchOutcome::Empty.status();
        assert_eq!(empty.level, StatusLevel::Warning);
        assert_eq!(empty.processed, 0);

        let failed = FetchOutcome::Failed {
            message: "NewsAPI error: boom".into(),
        }
        .status();
        assert_eq!(failed.level, StatusLevel::Error);
        assert_eq!(failed.message, "NewsAPI error: boom");
    }
}
