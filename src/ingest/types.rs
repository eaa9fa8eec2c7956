// src/ingest/types.rs
use anyhow::Result;

use crate::record::Headline;

/// A source of top headlines. One call is one upstream request.
#[async_trait::async_trait]
pub trait HeadlineProvider: Send + Sync {
    /// Up to `limit` valid headlines; an upstream failure is an `Err`.
    async fn fetch_top_headlines(&self, limit: u32) -> Result<Vec<Headline>>;
    fn name(&self) -> &'static str;
}
