// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod sentiment;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::config::AppConfig;
pub use crate::record::{Headline, HeadlineRecord, Sentiment};
