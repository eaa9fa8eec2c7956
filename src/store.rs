//! # Prediction store
//! Flat directory of immutable batch files, one per fetch.
//!
//! Each file is `pred_<uuid>.json` holding a JSON array of
//! [`HeadlineRecord`]s. There is no index: loads list the directory and
//! order files by modification time.

use anyhow::{bail, Context, Result};
use metrics::counter;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::record::HeadlineRecord;

pub const DEFAULT_MAX_FILES: usize = 50;
pub const DEFAULT_LOAD_LIMIT: usize = 200;

const FILE_PREFIX: &str = "pred_";
const FILE_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct PredictionStore {
    dir: PathBuf,
    max_files: usize,
}

impl PredictionStore {
    /// Open (and create if absent) the batch directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating prediction dir {}", dir.display()))?;
        Ok(Self {
            dir,
            max_files: DEFAULT_MAX_FILES,
        })
    }

    /// Number of newest files a load scans.
    pub fn with_max_files(mut self, n: usize) -> Self {
        self.max_files = n.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one batch under a fresh random name. Empty batches are refused.
    pub fn write_batch(&self, records: &[HeadlineRecord]) -> Result<PathBuf> {
        if records.is_empty() {
            bail!("refusing to write an empty batch");
        }
        let token = uuid::Uuid::new_v4().simple().to_string();
        let path = self.dir.join(format!("{FILE_PREFIX}{token}.{FILE_EXT}"));
        let tmp = self.dir.join(format!(".{FILE_PREFIX}{token}.tmp"));

        let body = serde_json::to_vec_pretty(records).context("serializing batch")?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("renaming into {}", path.display()))?;

        counter!("store_batches_written_total").increment(1);
        tracing::info!(
            target: "store",
            file = %path.display(),
            records = records.len(),
            "batch written"
        );
        Ok(path)
    }

    /// Batch files, newest modification time first, at most `max_files`.
    pub fn recent_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("listing {}", self.dir.display()))?;

        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| is_batch_file(p))
            .filter_map(|p| {
                let mtime = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
                Some((mtime, p))
            })
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0));
        files.truncate(self.max_files);
        Ok(files.into_iter().map(|(_, p)| p).collect())
    }

    /// Newest `n` records across the most recent batch files.
    ///
    /// Files are concatenated newest first; unreadable files are skipped,
    /// duplicate ids keep their first occurrence, and the result is sorted by
    /// `publishedAt` descending with unparseable timestamps last.
    pub fn load_recent(&self, n: usize) -> Vec<HeadlineRecord> {
        let files = match self.recent_files() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(target: "store", error = ?e, "listing batch files failed");
                return Vec::new();
            }
        };

        let mut all = Vec::new();
        for f in &files {
            match read_batch(f) {
                Ok(mut recs) => all.append(&mut recs),
                Err(e) => {
                    counter!("store_files_skipped_total").increment(1);
                    tracing::warn!(target: "store", file = %f.display(), error = ?e, "skipping batch file");
                }
            }
        }

        let mut out = dedup_by_id(all);
        sort_newest_first(&mut out);
        out.truncate(n);
        out
    }
}

/// Read one batch file.
pub fn read_batch(path: &Path) -> Result<Vec<HeadlineRecord>> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn is_batch_file(p: &Path) -> bool {
    p.is_file()
        && p.extension().and_then(|s| s.to_str()) == Some(FILE_EXT)
        && p.file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|s| !s.starts_with('.'))
}

/// Keep the first record seen for each id.
pub fn dedup_by_id(records: Vec<HeadlineRecord>) -> Vec<HeadlineRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Stable sort by parsed `publishedAt`, newest first; unparseable last.
pub fn sort_newest_first(records: &mut [HeadlineRecord]) {
    records.sort_by(|a, b| match (a.published(), b.published()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
