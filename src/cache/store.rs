//! Durable storage for cached report entries
//!
//! Provides a `CacheStore` that persists one JSON file per cache key, with
//! atomic replacement on write and miss-on-corruption reads.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::key::{CacheKey, ReportKind};

/// File extension for stored entries
const ENTRY_EXT: &str = "json";

/// Distinguishes temporary files written concurrently by one process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A cached report as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Which report this is
    pub kind: ReportKind,
    /// The job posting the report belongs to
    pub job_post_id: String,
    /// The report body, opaque to the cache
    pub payload: Value,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

/// Errors raised while reading or writing entries
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading, writing or removing a file failed
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not contain a valid entry
    #[error("corrupt cache entry at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The file holds an entry for a different key
    #[error("cache entry at {path} belongs to {found}, expected {expected}")]
    KeyMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The entry could not be serialized
    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes cached report entries on disk
///
/// Entries live as `<encoded key>.json` files in a single directory
/// (`~/.cache/hirecache/` on Linux by default). Expiry is not decided here:
/// stale entries are returned like any other and judged by the caller's
/// [`ExpiryPolicy`](super::ExpiryPolicy).
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where entry files are stored
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Creates a store in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "hirecache")?;
        Some(Self::with_dir(project_dirs.cache_dir().join("reports")))
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Returns the path of the file backing `key`
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key.encode(), ENTRY_EXT))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| StorageError::Io {
            path: self.cache_dir.clone(),
            source,
        })
    }

    /// Reads the entry for `key`, distinguishing a miss from a fault
    ///
    /// # Returns
    /// * `Ok(Some(entry))` if a valid entry is stored, expired or not
    /// * `Ok(None)` if nothing is stored under the key
    /// * `Err(StorageError)` if the file cannot be read or does not hold an entry for `key`
    pub fn try_get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StorageError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let entry: CacheEntry =
            serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if entry.kind != key.kind() || entry.job_post_id != key.job_post_id() {
            return Err(StorageError::KeyMismatch {
                path,
                expected: key.to_string(),
                found: format!("{}/{}", entry.kind, entry.job_post_id),
            });
        }

        Ok(Some(entry))
    }

    /// Reads the entry for `key`, treating any storage fault as a miss
    ///
    /// Faults are logged at warn level and never propagated.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.try_get(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Stores `payload` under `key`, replacing any existing entry
    ///
    /// The entry is written to a temporary sibling file and renamed into
    /// place, so readers see either the old entry or the new one.
    pub fn put(&self, key: &CacheKey, payload: Value) -> Result<CacheEntry, StorageError> {
        self.ensure_dir()?;

        self.write_entry(key, payload, Utc::now())
    }

    /// Stores an entry with an explicit timestamp, for simulating aged entries
    #[cfg(test)]
    pub(crate) fn put_stored_at(
        &self,
        key: &CacheKey,
        payload: Value,
        stored_at: DateTime<Utc>,
    ) -> Result<CacheEntry, StorageError> {
        self.ensure_dir()?;
        self.write_entry(key, payload, stored_at)
    }

    fn write_entry(
        &self,
        key: &CacheKey,
        payload: Value,
        stored_at: DateTime<Utc>,
    ) -> Result<CacheEntry, StorageError> {
        let entry = CacheEntry {
            kind: key.kind(),
            job_post_id: key.job_post_id().to_string(),
            payload,
            stored_at,
        };
        let json = serde_json::to_string_pretty(&entry)?;

        let path = self.entry_path(key);
        let tmp_path = self.cache_dir.join(format!(
            "{}.{}.{}.tmp",
            key.encode(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp_path, json).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::Io { path, source });
        }

        debug!(key = %key, "stored cache entry");
        Ok(entry)
    }

    /// Removes the entry for `key`; removing a missing entry is a no-op
    pub fn delete(&self, key: &CacheKey) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, "deleted cache entry");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    /// Removes every kind stored for a job posting
    pub fn delete_all(&self, job_post_id: &str) -> Result<(), StorageError> {
        for kind in ReportKind::ALL {
            let Ok(key) = CacheKey::new(kind, job_post_id) else {
                // An empty id can never have been stored.
                return Ok(());
            };
            self.delete(&key)?;
        }
        Ok(())
    }

    /// Lists the keys currently stored, ignoring unrelated files
    pub fn keys(&self) -> Result<Vec<CacheKey>, StorageError> {
        let read_dir = match fs::read_dir(&self.cache_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.cache_dir.clone(),
                    source,
                })
            }
        };

        let mut keys = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| StorageError::Io {
                path: self.cache_dir.clone(),
                source,
            })?;
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(encoded) = name.strip_suffix(&format!(".{}", ENTRY_EXT)) else {
                continue;
            };
            if let Ok(key) = CacheKey::decode(encoded) {
                keys.push(key);
            }
        }

        keys.sort_by(|a, b| {
            a.job_post_id()
                .cmp(b.job_post_id())
                .then(a.kind().cmp(&b.kind()))
        });
        Ok(keys)
    }
}
