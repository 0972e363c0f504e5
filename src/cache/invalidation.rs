//! Manual invalidation of cached reports
//!
//! Clearing a base report does not touch the final report built from it.

use tracing::info;

use super::key::{CacheKey, ReportKind};
use super::store::{CacheStore, StorageError};

#[derive(Debug, Clone)]
pub struct Invalidator {
    store: CacheStore,
}

impl Invalidator {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Removes one kind for a job posting
    pub fn clear(&self, kind: ReportKind, job_post_id: &str) -> Result<(), StorageError> {
        let Ok(key) = CacheKey::new(kind, job_post_id) else {
            return Ok(());
        };
        self.store.delete(&key)?;
        info!(kind = %kind, job_post_id, "cleared cached report");
        Ok(())
    }

    /// Removes every kind for a job posting
    pub fn clear_all(&self, job_post_id: &str) -> Result<(), StorageError> {
        self.store.delete_all(job_post_id)?;
        info!(job_post_id, "cleared all cached reports");
        Ok(())
    }
}
