//! Disk cache for the last journey API response.
//!
//! Only one snapshot is kept: the raw payload of the most recent fetch,
//! when it happened, and which end of the commute it started from.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::LocationRole;

/// Errors from reading or writing the cache file.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read cache file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write cache file {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// The persisted state of the last fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Unix timestamp (fractional seconds) of the last successful fetch.
    #[serde(rename = "last_fetch")]
    pub last_fetch_secs: f64,

    /// Which end of the commute the cached connections start from.
    pub start_location: LocationRole,

    /// The raw API response, `null` if nothing has been fetched.
    #[serde(default)]
    pub data: Value,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self {
            last_fetch_secs: 0.0,
            start_location: LocationRole::Home,
            data: Value::Null,
        }
    }
}

impl CacheSnapshot {
    /// Whether this snapshot is older than `refresh_interval` at `now_secs`.
    pub fn is_stale(&self, now_secs: f64, refresh_interval: Duration) -> bool {
        self.last_fetch_secs + refresh_interval.as_secs_f64() < now_secs
    }
}

/// Result of loading the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad {
    Present(CacheSnapshot),
    /// No cache file exists yet.
    Absent,
}

impl CacheLoad {
    /// The loaded snapshot, or the empty default when absent.
    pub fn into_snapshot(self) -> CacheSnapshot {
        match self {
            CacheLoad::Present(snapshot) => snapshot,
            CacheLoad::Absent => CacheSnapshot::default(),
        }
    }
}

/// File-backed store for a single [`CacheSnapshot`].
#[derive(Debug, Clone)]
pub struct ConnectionCache {
    path: PathBuf,
}

impl ConnectionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted snapshot.
    ///
    /// A missing file is [`CacheLoad::Absent`], not an error.
    pub fn load(&self) -> Result<CacheLoad, CacheError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no existing cache file found");
                return Ok(CacheLoad::Absent);
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot = serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "existing cache file found");
        Ok(CacheLoad::Present(snapshot))
    }

    /// Persist `snapshot`, replacing whatever was stored before.
    ///
    /// The record is written to a temporary sibling and renamed into place,
    /// so readers see either the old or the new snapshot.
    pub fn store(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let write_err = |message: String| CacheError::Write {
            path: self.path.clone(),
            message,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| write_err(format!("failed to create cache directory: {e}")))?;
        }

        let tmp_path = self.tmp_path();
        if let Err(message) = replace_with(&tmp_path, &self.path, snapshot) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_err(message));
        }

        debug!(path = %self.path.display(), "stored cache");
        Ok(())
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Write `snapshot` to `tmp_path`, sync it, then rename it over `dest`.
fn replace_with(tmp_path: &Path, dest: &Path, snapshot: &CacheSnapshot) -> Result<(), String> {
    let file =
        File::create(tmp_path).map_err(|e| format!("failed to create temporary file: {e}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, snapshot)
        .map_err(|e| format!("failed to serialize cache: {e}"))?;
    writer
        .flush()
        .map_err(|e| format!("failed to flush cache: {e}"))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| format!("failed to sync cache: {e}"))?;
    drop(writer);

    std::fs::rename(tmp_path, dest).map_err(|e| format!("failed to replace cache file: {e}"))
}
