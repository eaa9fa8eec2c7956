//! # Dashboard view
//! Aggregates loaded records into everything the page draws: metric tiles,
//! the headlines table, the label bar chart and the positivity line chart.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::{AppConfig, Slider};
use crate::record::{HeadlineRecord, Sentiment};

const TABLE_TIME_FMT: &str = "%Y-%m-%d %H:%M";
const FOOTER_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl Summary {
    pub fn count(&self, s: Sentiment) -> usize {
        match s {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// `%Y-%m-%d %H:%M`, empty when the stored timestamp does not parse.
    pub published: String,
    pub source: String,
    pub headline: String,
    pub sentiment: Sentiment,
    pub positivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub sentiment: Sentiment,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub published_at: String,
    pub prob_pos: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Display-only.
    pub refresh_interval: Slider,
    pub fetch_limit: Slider,
}

impl Settings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval.clone(),
            fetch_limit: cfg.fetch_limit.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub generated_at: String,
    pub empty: bool,
    pub summary: Summary,
    pub rows: Vec<TableRow>,
    pub distribution: Vec<LabelCount>,
    pub trend: Vec<TrendPoint>,
    pub settings: Settings,
}

impl DashboardView {
    /// `records` are expected newest first, as the store returns them.
    pub fn build(records: &[HeadlineRecord], settings: Settings, now: DateTime<Utc>) -> Self {
        let summary = summarize(records);
        Self {
            generated_at: now.format(FOOTER_TIME_FMT).to_string(),
            empty: records.is_empty(),
            rows: records.iter().map(table_row).collect(),
            distribution: distribution(&summary),
            trend: trend(records),
            summary,
            settings,
        }
    }
}

pub fn summarize(records: &[HeadlineRecord]) -> Summary {
    let mut s = Summary {
        total: records.len(),
        ..Summary::default()
    };
    for r in records {
        match r.sentiment {
            Sentiment::Positive => s.positive += 1,
            Sentiment::Negative => s.negative += 1,
            Sentiment::Neutral => s.neutral += 1,
        }
    }
    s
}

fn table_row(r: &HeadlineRecord) -> TableRow {
    TableRow {
        published: r
            .published()
            .map(|t| t.format(TABLE_TIME_FMT).to_string())
            .unwrap_or_default(),
        source: r.source.clone(),
        headline: r.title.clone(),
        sentiment: r.sentiment,
        positivity: round3(r.prob_pos),
    }
}

/// Non-zero label counts, largest first; ties keep `Sentiment::ALL` order.
pub fn distribution(summary: &Summary) -> Vec<LabelCount> {
    let mut out: Vec<LabelCount> = Sentiment::ALL
        .iter()
        .map(|&s| LabelCount {
            sentiment: s,
            count: summary.count(s),
            color: s.color(),
        })
        .filter(|c| c.count > 0)
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Positivity over time, oldest first. Records without a usable timestamp are left out.
pub fn trend(records: &[HeadlineRecord]) -> Vec<TrendPoint> {
    let mut pts: Vec<(DateTime<Utc>, f64)> = records
        .iter()
        .filter_map(|r| r.published().map(|t| (t, r.prob_pos)))
        .collect();
    pts.sort_by_key(|(t, _)| *t);
    pts.into_iter()
        .map(|(t, p)| TrendPoint {
            published_at: t.to_rfc3339_opts(SecondsFormat::Secs, true),
            prob_pos: round3(p),
        })
        .collect()
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
