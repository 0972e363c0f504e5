//! Freshness inspection across report kinds
//!
//! The inspector only reads the store: it never fetches, writes or deletes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::expiry::ExpiryPolicy;
use super::key::{CacheKey, ReportKind};
use super::store::CacheStore;

/// Freshness of one report kind for one job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Whether an entry is stored
    pub exists: bool,
    /// Whether the stored entry is older than its TTL (false when absent)
    pub expired: bool,
    /// Age of the stored entry, `None` when absent
    pub age_seconds: Option<i64>,
}

impl CacheStatus {
    pub const ABSENT: CacheStatus = CacheStatus {
        exists: false,
        expired: false,
        age_seconds: None,
    };

    /// Present and within its TTL
    pub fn is_fresh(&self) -> bool {
        self.exists && !self.expired
    }

    /// Short label used in summaries
    pub fn label(&self) -> &'static str {
        match (self.exists, self.expired) {
            (false, _) => "absent",
            (true, true) => "stale",
            (true, false) => "cached",
        }
    }
}

/// Status of every report kind for one job posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    job_post_id: String,
    statuses: BTreeMap<ReportKind, CacheStatus>,
}

impl StatusReport {
    pub fn job_post_id(&self) -> &str {
        &self.job_post_id
    }

    pub fn get(&self, kind: ReportKind) -> CacheStatus {
        self.statuses
            .get(&kind)
            .copied()
            .unwrap_or(CacheStatus::ABSENT)
    }

    /// Iterates kinds in display order
    pub fn iter(&self) -> impl Iterator<Item = (ReportKind, CacheStatus)> + '_ {
        self.statuses.iter().map(|(kind, status)| (*kind, *status))
    }

    /// Base kinds that are absent or expired
    pub fn missing_base_kinds(&self) -> Vec<ReportKind> {
        self.iter()
            .filter(|(kind, status)| kind.is_base() && !status.is_fresh())
            .map(|(kind, _)| kind)
            .collect()
    }

    /// One fragment per kind, e.g. `document: cached (2m) | final: absent`
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(kind, status)| match status.age_seconds {
                Some(age) => format!("{}: {} ({})", kind, status.label(), format_age(age)),
                None => format!("{}: {}", kind, status.label()),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Reports existence, expiry and age of cached reports
#[derive(Debug, Clone)]
pub struct StatusInspector {
    store: CacheStore,
    policy: ExpiryPolicy,
}

impl StatusInspector {
    pub fn new(store: CacheStore, policy: ExpiryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// Status of every kind for `job_post_id`, as of now
    pub fn status(&self, job_post_id: &str) -> StatusReport {
        self.status_at(job_post_id, Utc::now())
    }

    /// Status of every kind for `job_post_id`, as of `now`
    pub fn status_at(&self, job_post_id: &str, now: DateTime<Utc>) -> StatusReport {
        let statuses = ReportKind::ALL
            .into_iter()
            .map(|kind| (kind, self.kind_status(kind, job_post_id, now)))
            .collect();

        StatusReport {
            job_post_id: job_post_id.to_string(),
            statuses,
        }
    }

    /// Status of a single kind, as of `now`
    pub fn kind_status(
        &self,
        kind: ReportKind,
        job_post_id: &str,
        now: DateTime<Utc>,
    ) -> CacheStatus {
        let entry = CacheKey::new(kind, job_post_id)
            .ok()
            .and_then(|key| self.store.get(&key));

        match entry {
            Some(entry) => CacheStatus {
                exists: true,
                expired: self.policy.is_expired(&entry, now),
                age_seconds: Some(self.policy.age(&entry, now).num_seconds()),
            },
            None => CacheStatus::ABSENT,
        }
    }

    /// Human-readable rollup of [`StatusInspector::status`]
    pub fn summary(&self, job_post_id: &str) -> String {
        self.status(job_post_id).summary()
    }
}

/// Compact age such as `45s`, `12m`, `3h` or `2d`
fn format_age(seconds: i64) -> String {
    match seconds {
        s if s < 60 => format!("{}s", s),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}
