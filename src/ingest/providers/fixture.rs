// src/ingest/providers/fixture.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::newsapi::parse_top_headlines;
use crate::ingest::types::HeadlineProvider;
use crate::record::Headline;

/// Serves a canned NewsAPI response body. No HTTP.
pub struct FixtureProvider {
    mode: Mode,
}

enum Mode {
    Body(String),
    Fail(String),
}

impl FixtureProvider {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Body(body.to_string()),
        }
    }

    /// A provider whose every fetch fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            mode: Mode::Fail(message.to_string()),
        }
    }
}

#[async_trait]
impl HeadlineProvider for FixtureProvider {
    async fn fetch_top_headlines(&self, limit: u32) -> Result<Vec<Headline>> {
        match &self.mode {
            Mode::Body(body) => {
                let mut out = parse_top_headlines(body, Utc::now())?;
                out.truncate(limit as usize);
                Ok(out)
            }
            Mode::Fail(msg) => Err(anyhow!("{msg}")),
        }
    }

    fn name(&self) -> &'static str {
        "Fixture"
    }
}
