//! # Sentiment
//! Polarity scoring behind the [`PolarityScorer`] seam, plus the fixed
//! polarity → label mapping used by the dashboard.
//!
//! Polarity is a real value in `[-1, 1]`. Labels use exclusive thresholds at
//! `±0.1`; the positivity score is polarity rescaled to `[0, 1]`.

use anyhow::{bail, Result};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::record::{Headline, HeadlineRecord, Sentiment};

pub const POSITIVE_THRESHOLD: f64 = 0.1;
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Label and positivity used when a title cannot be scored.
pub const FALLBACK: (Sentiment, f64) = (Sentiment::Neutral, 0.5);

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)[\w']+").expect("word regex"));

/// Text polarity provider. Implementations may fail per text; callers
/// degrade to [`FALLBACK`] instead of failing a batch.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> Result<f64>;
    fn name(&self) -> &'static str;
}

/// Lexicon-averaging scorer over the embedded `sentiment_lexicon.json`.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> Option<f64> {
        LEXICON.get(w).copied()
    }
}

impl PolarityScorer for LexiconScorer {
    /// Mean of the lexicon scores found in `text`.
    ///
    /// A preceding intensifier scales the word; a negator within the previous
    /// 1..=3 tokens flips it at half strength.
    fn polarity(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            bail!("empty text");
        }
        let tokens = tokenize(text);

        let mut sum = 0.0f64;
        let mut n = 0usize;
        for i in 0..tokens.len() {
            let Some(base) = self.word_score(&tokens[i]) else {
                continue;
            };
            let boost = if i > 0 {
                intensifier(&tokens[i - 1]).unwrap_or(1.0)
            } else {
                1.0
            };
            let negated = (1..=3).any(|k| i >= k && is_negator(&tokens[i - k]));

            let mut s = base * boost;
            if negated {
                s *= -0.5;
            }
            sum += s;
            n += 1;
        }

        if n == 0 {
            return Ok(0.0);
        }
        Ok((sum / n as f64).clamp(-1.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Entity-decoded, lowercased word tokens; inner apostrophes are kept.
fn tokenize(s: &str) -> Vec<String> {
    let decoded = html_escape::decode_html_entities(s)
        .replace(['\u{2018}', '\u{2019}'], "'")
        .to_lowercase();
    RE_WORD
        .find_iter(&decoded)
        .map(|m| m.as_str().trim_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "without"
    )
}

fn intensifier(tok: &str) -> Option<f64> {
    match tok {
        "very" | "really" | "so" => Some(1.3),
        "extremely" | "incredibly" | "hugely" => Some(1.5),
        "slightly" | "somewhat" => Some(0.5),
        _ => None,
    }
}

/// `p > 0.1` → Positive, `p < -0.1` → Negative, otherwise Neutral.
pub fn label_for_polarity(p: f64) -> Sentiment {
    if p > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if p < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Polarity rescaled to `[0, 1]`.
pub fn positivity(p: f64) -> f64 {
    if !p.is_finite() {
        return FALLBACK.1;
    }
    ((p + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Score one title. Scorer failures fall back to Neutral / 0.5.
pub fn classify(scorer: &dyn PolarityScorer, title: &str) -> (Sentiment, f64) {
    match scorer.polarity(title) {
        Ok(p) if p.is_finite() => {
            let p = p.clamp(-1.0, 1.0);
            (label_for_polarity(p), positivity(p))
        }
        Ok(p) => {
            scoring_failed(scorer, title, &format!("non-finite polarity {p}"));
            FALLBACK
        }
        Err(e) => {
            scoring_failed(scorer, title, &format!("{e:#}"));
            FALLBACK
        }
    }
}

fn scoring_failed(scorer: &dyn PolarityScorer, title: &str, error: &str) {
    counter!("sentiment_scoring_failures_total").increment(1);
    // Never log raw text. Only hashed id.
    tracing::debug!(
        target: "sentiment",
        id = %anon_hash(title),
        scorer = scorer.name(),
        error,
        "scoring failed, using neutral default"
    );
}

/// Label a whole batch; never fails.
pub fn classify_batch(scorer: &dyn PolarityScorer, headlines: Vec<Headline>) -> Vec<HeadlineRecord> {
    headlines
        .into_iter()
        .map(|h| {
            let (sentiment, prob_pos) = classify(scorer, &h.title);
            h.label(sentiment, prob_pos)
        })
        .collect()
}

/// Short, stable fingerprint for logging text without revealing it.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
