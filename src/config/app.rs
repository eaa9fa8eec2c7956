// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_NEWSAPI_URL: &str = "NEWSAPI_URL";
pub const ENV_PRED_DIR: &str = "PRED_DIR";

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
/// Placeholder only; NewsAPI rejects it. Set `NEWSAPI_KEY` for real fetches.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_NEWSAPI_KEY";
pub const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2/top-headlines";

fn default_api_key() -> String {
    PLACEHOLDER_API_KEY.to_string()
}
fn default_url() -> String {
    DEFAULT_NEWSAPI_URL.to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_country() -> String {
    "us".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_pred_dir() -> PathBuf {
    PathBuf::from("predictions")
}
fn default_max_files() -> usize {
    store::DEFAULT_MAX_FILES
}
fn default_load_limit() -> usize {
    store::DEFAULT_LOAD_LIMIT
}
fn default_refresh_interval() -> Slider {
    Slider::new("Refresh interval (seconds)", 10, 120, 30)
}
fn default_fetch_limit() -> Slider {
    Slider::new("Number of articles to fetch", 5, 50, 20)
}

/// Integer slider shown in the settings panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slider {
    #[serde(default)]
    pub label: String,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Slider {
    pub fn new(label: &str, min: u32, max: u32, default: u32) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
            default,
        }
    }

    /// Clamp a user-supplied value into range; `None` picks the default.
    pub fn clamp(&self, v: Option<u32>) -> u32 {
        v.unwrap_or(self.default).clamp(self.min, self.max)
    }

    /// Keep `min <= default <= max`, swapping an inverted range.
    fn sanitize(&mut self, fallback: Slider) {
        if self.label.trim().is_empty() {
            self.label = fallback.label;
        }
        if self.min > self.max {
            std::mem::swap(&mut self.min, &mut self.max);
        }
        self.default = self.default.clamp(self.min, self.max);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Overridden by `NEWSAPI_KEY`.
    #[serde(default = "default_api_key")]
    pub newsapi_key: String,
    #[serde(default = "default_url")]
    pub newsapi_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Batch file directory; overridden by `PRED_DIR`.
    #[serde(default = "default_pred_dir")]
    pub pred_dir: PathBuf,
    /// How many of the newest batch files a load scans.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Records shown on the dashboard.
    #[serde(default = "default_load_limit")]
    pub load_limit: usize,
    /// Display-only; nothing schedules fetches from it.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Slider,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: Slider,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            newsapi_key: default_api_key(),
            newsapi_url: default_url(),
            language: default_language(),
            country: default_country(),
            timeout_secs: default_timeout_secs(),
            pred_dir: default_pred_dir(),
            max_files: default_max_files(),
            load_limit: default_load_limit(),
            refresh_interval: default_refresh_interval(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        Ok(cfg.finish())
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (`NEWSAPI_KEY`, `NEWSAPI_URL`, `PRED_DIR`) apply in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::default().finish())
    }

    fn finish(mut self) -> Self {
        self.apply_env();
        self.sanitize();
        self
    }

    fn apply_env(&mut self) {
        if let Some(key) = non_empty_env(ENV_NEWSAPI_KEY) {
            self.newsapi_key = key;
        }
        if let Some(url) = non_empty_env(ENV_NEWSAPI_URL) {
            self.newsapi_url = url;
        }
        if let Some(dir) = non_empty_env(ENV_PRED_DIR) {
            self.pred_dir = PathBuf::from(dir);
        }
    }

    fn sanitize(&mut self) {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.max_files == 0 {
            self.max_files = default_max_files();
        }
        if self.load_limit == 0 {
            self.load_limit = default_load_limit();
        }
        self.refresh_interval.sanitize(default_refresh_interval());
        self.fetch_limit.sanitize(default_fetch_limit());
    }

    /// True while the key is still the shipped placeholder.
    pub fn uses_placeholder_key(&self) -> bool {
        self.newsapi_key == PLACEHOLDER_API_KEY
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
