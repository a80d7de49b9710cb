//! Metrics store: append, prune by age, persist.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use healthwatch_core::CheckResult;

use crate::error::{MetricsError, MetricsResult};

/// One collected check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsEntry {
    pub timestamp: DateTime<Utc>,
    pub results: CheckResult,
}

/// Insertion-ordered window of check results no older than `retention`.
pub struct MetricsStore {
    path: PathBuf,
    retention: TimeDelta,
    window: VecDeque<MetricsEntry>,
}

impl MetricsStore {
    /// Empty store persisting to `path`.
    pub fn new(path: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            path: path.into(),
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
            window: VecDeque::new(),
        }
    }

    /// Store seeded from the file at `path`. An unreadable or corrupt file
    /// is logged and the store starts empty.
    pub async fn open(path: impl Into<PathBuf>, retention: Duration) -> Self {
        let mut store = Self::new(path, retention);
        match load_window(&store.path).await {
            Ok(window) => {
                store.window = window;
                let pruned = store.prune(Utc::now());
                debug!(
                    path = %store.path.display(),
                    entries = store.window.len(),
                    pruned,
                    "metrics history loaded"
                );
            }
            Err(e) => warn!(error = %e, "starting with empty metrics history"),
        }
        store
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MetricsEntry> {
        self.window.iter()
    }

    pub fn latest(&self) -> Option<&MetricsEntry> {
        self.window.back()
    }

    /// Append `result`, drop every entry older than `retention` relative to
    /// the result's timestamp, and rewrite the file. Returns the number of
    /// pruned entries.
    ///
    /// The in-memory window is updated even when persisting fails.
    pub async fn append(&mut self, result: CheckResult) -> MetricsResult<usize> {
        let now = result.timestamp;
        self.window.push_back(MetricsEntry {
            timestamp: now,
            results: result,
        });
        let pruned = self.prune(now);
        self.persist().await?;
        debug!(entries = self.window.len(), pruned, "metrics appended");
        Ok(pruned)
    }

    /// Drop entries with `timestamp < now - retention`.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let before = self.window.len();
        self.window.retain(|entry| entry.timestamp >= cutoff);
        before - self.window.len()
    }

    async fn persist(&self) -> MetricsResult<()> {
        let body = serde_json::to_vec_pretty(&self.window)?;
        let write_err = |source: std::io::Error| MetricsError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, body).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

async fn load_window(path: &Path) -> MetricsResult<VecDeque<MetricsEntry>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(VecDeque::new()),
        Err(source) => {
            return Err(MetricsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&content).map_err(|source| MetricsError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
