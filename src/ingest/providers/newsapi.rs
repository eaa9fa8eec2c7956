// src/ingest/providers/newsapi.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::histogram;
use serde::Deserialize;
use std::time::Duration;

use crate::config::AppConfig;
use crate::ingest::types::HeadlineProvider;
use crate::record::Headline;

/// Marker NewsAPI puts in place of withdrawn articles.
pub const REMOVED_MARKER: &str = "[Removed]";
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct TopHeadlines {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    source: Option<ArticleSource>,
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// Absent and `""` both count as missing; whitespace is kept as-is.
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

/// Parse a `/v2/top-headlines` body into headlines.
///
/// Articles without a title, or with the `[Removed]` marker, are dropped.
/// Missing url → random id, missing source → `Unknown`, missing
/// `publishedAt` → `now`.
pub fn parse_top_headlines(body: &str, now: DateTime<Utc>) -> Result<Vec<Headline>> {
    let t0 = std::time::Instant::now();
    let parsed: TopHeadlines = serde_json::from_str(body).context("parsing newsapi json")?;
    let fetched_at = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut out = Vec::with_capacity(parsed.articles.len());
    for a in parsed.articles {
        let Some(title) = non_empty(a.title) else {
            continue;
        };
        if title == REMOVED_MARKER {
            continue;
        }
        out.push(Headline {
            id: non_empty(a.url).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            source: a
                .source
                .and_then(|s| non_empty(s.name))
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            title,
            published_at: non_empty(a.published_at).unwrap_or_else(|| fetched_at.clone()),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    Ok(out)
}

/// Live NewsAPI provider: one GET per fetch, bounded by the configured timeout.
pub struct NewsApiProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    language: String,
    country: String,
}

impl NewsApiProvider {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building newsapi http client")?;
        Ok(Self {
            client,
            url: cfg.newsapi_url.clone(),
            api_key: cfg.newsapi_key.clone(),
            language: cfg.language.clone(),
            country: cfg.country.clone(),
        })
    }
}

#[async_trait]
impl HeadlineProvider for NewsApiProvider {
    async fn fetch_top_headlines(&self, limit: u32) -> Result<Vec<Headline>> {
        let page_size = limit.to_string();
        let query = [
            ("apiKey", self.api_key.as_str()),
            ("language", self.language.as_str()),
            ("country", self.country.as_str()),
            ("pageSize", page_size.as_str()),
        ];

        // Strip the URL from errors: it carries the api key.
        let resp = self
            .client
            .get(&self.url)
            .query(&query)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("newsapi request")?
            .error_for_status()
            .map_err(|e| e.without_url())
            .context("newsapi non-2xx")?;
        let body = resp
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("newsapi .text()")?;

        let mut out = parse_top_headlines(&body, Utc::now())?;
        out.truncate(limit as usize);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
