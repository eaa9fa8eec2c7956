//! # Headline records
//! The one persisted entity: a headline plus its sentiment label.
//!
//! Field names on disk follow the NewsAPI casing (`publishedAt`) so batch
//! files stay readable next to raw API responses.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Stable display order (bar chart tie-break, metric tiles).
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Chart color used by the dashboard.
    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::Positive => "#2ecc71",
            Sentiment::Negative => "#e74c3c",
            Sentiment::Neutral => "#95a5a6",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched headline that has not been scored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub id: String,
    pub source: String,
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

impl Headline {
    pub fn label(self, sentiment: Sentiment, prob_pos: f64) -> HeadlineRecord {
        HeadlineRecord {
            id: self.id,
            source: self.source,
            title: self.title,
            published_at: self.published_at,
            sentiment,
            prob_pos,
        }
    }
}

/// Persisted record. One batch file holds a JSON array of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    pub id: String,
    pub source: String,
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub sentiment: Sentiment,
    pub prob_pos: f64,
}

impl HeadlineRecord {
    /// Parsed `publishedAt`; `None` when the stored string is not a timestamp.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published_at)
    }
}

/// Lenient timestamp parsing: RFC 3339 first, then naive ISO-8601 read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
