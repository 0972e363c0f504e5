//! Per-kind freshness rules

use chrono::{DateTime, Duration, Utc};

use super::key::ReportKind;
use super::store::CacheEntry;
use crate::config::CacheConfig;

/// Time-to-live for each report kind
///
/// Base reports change while screening is underway, so they default to a
/// short window. The final report is produced near the end of the process
/// and is trusted for much longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub document: Duration,
    pub written: Duration,
    pub interview: Duration,
    pub final_report: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            document: Duration::hours(1),
            written: Duration::hours(1),
            interview: Duration::hours(1),
            final_report: Duration::hours(24),
        }
    }
}

impl ExpiryPolicy {
    /// Builds a policy from the `[cache]` configuration section
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            document: secs(config.ttl_document_secs),
            written: secs(config.ttl_written_secs),
            interview: secs(config.ttl_interview_secs),
            final_report: secs(config.ttl_final_secs),
        }
    }

    /// Applies one TTL to every kind
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            document: ttl,
            written: ttl,
            interview: ttl,
            final_report: ttl,
        }
    }

    pub fn ttl(&self, kind: ReportKind) -> Duration {
        match kind {
            ReportKind::Document => self.document,
            ReportKind::Written => self.written,
            ReportKind::Interview => self.interview,
            ReportKind::Final => self.final_report,
        }
    }

    /// How long ago the entry was stored; never negative
    pub fn age(&self, entry: &CacheEntry, now: DateTime<Utc>) -> Duration {
        (now - entry.stored_at).max(Duration::zero())
    }

    /// An entry is expired once its age strictly exceeds its kind's TTL
    pub fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.age(entry, now) > self.ttl(entry.kind)
    }
}

fn secs(value: u64) -> Duration {
    let max_secs = i64::MAX / 1_000;
    Duration::seconds(i64::try_from(value).unwrap_or(max_secs).min(max_secs))
}
