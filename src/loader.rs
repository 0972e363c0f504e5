//! Cache-first loading of the final hiring report
//!
//! The final report is a snapshot of the document, written-test and
//! interview reports plus fresh job posting metadata. Loading goes through
//! three stages:
//!
//! 1. A fresh final entry is returned as-is, without any network call.
//! 2. Otherwise, if any base report is absent or expired, the load stops and
//!    reports which ones are missing so the caller can resolve them first.
//! 3. Otherwise the snapshot is assembled from cached base reports (fetching
//!    any that expired in the meantime) and stored as the new final entry.
//!
//! A fresh final entry is trusted even if the base entries it was built from
//! have since expired or been cleared.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheKey, CacheStore, ExpiryPolicy, KeyError, ReportKind, StatusInspector,
    StorageError,
};
use crate::data::{CompositeFinalPayload, FetchError, InterviewPayload, InterviewStage, ReportApi};

/// Where a ready final report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    /// Served from a fresh final cache entry
    Cached,
    /// Assembled during this call and written to the cache
    Assembled,
}

/// Result of a load that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The final report is ready to render
    Ready {
        report: CompositeFinalPayload,
        origin: ReportOrigin,
    },
    /// Base reports that must be resolved before the final report can be built
    MissingReports(Vec<ReportKind>),
}

impl LoadOutcome {
    /// Display names of the missing reports; empty when ready
    pub fn missing_report_names(&self) -> Vec<&'static str> {
        match self {
            LoadOutcome::MissingReports(kinds) => {
                kinds.iter().map(ReportKind::display_name).collect()
            }
            LoadOutcome::Ready { .. } => Vec::new(),
        }
    }
}

/// One part of the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    JobPost,
    Report(ReportKind),
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::JobPost => f.write_str("job post"),
            Section::Report(kind) => f.write_str(kind.display_name()),
        }
    }
}

/// A section that could not be fetched
#[derive(Debug)]
pub struct SectionFailure {
    pub section: Section,
    pub error: FetchError,
}

/// Errors that can occur when loading or refreshing reports
#[derive(Debug, Error)]
pub enum LoadError {
    /// At least one section failed; the final report was not written
    #[error("final report is incomplete: {}", describe_failures(.0))]
    Incomplete(Vec<SectionFailure>),

    /// A single-report refresh failed; the existing entry is unchanged
    #[error("failed to refresh {kind}: {source}")]
    Fetch {
        kind: ReportKind,
        #[source]
        source: FetchError,
    },

    /// A newer full refresh started while this load was in flight
    #[error("load for job post {job_post_id} was superseded by a newer refresh")]
    Superseded { job_post_id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    InvalidKey(#[from] KeyError),
}

impl LoadError {
    /// Whether trying again later may succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            LoadError::Incomplete(failures) => failures.iter().any(|f| f.error.is_retriable()),
            LoadError::Fetch { source, .. } => source.is_retriable(),
            LoadError::Superseded { .. } => true,
            LoadError::Storage(_) | LoadError::InvalidKey(_) => false,
        }
    }

    /// Message suitable for showing to the person who triggered the load
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Incomplete(failures) => failures
                .iter()
                .map(|f| format!("{}: {}", f.section, f.error.user_message()))
                .collect::<Vec<_>>()
                .join("; "),
            LoadError::Fetch { kind, source } => {
                format!("{}: {}", kind.display_name(), source.user_message())
            }
            other => other.to_string(),
        }
    }
}

fn describe_failures(failures: &[SectionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.section, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads, assembles and refreshes cached reports for job postings
pub struct ReportLoader<A> {
    store: CacheStore,
    policy: ExpiryPolicy,
    inspector: StatusInspector,
    api: A,
    /// Bumped by `refresh_all`; loads started under an older value do not write
    generations: Mutex<HashMap<String, u64>>,
}

impl<A: ReportApi> ReportLoader<A> {
    pub fn new(store: CacheStore, policy: ExpiryPolicy, api: A) -> Self {
        Self {
            inspector: StatusInspector::new(store.clone(), policy),
            store,
            policy,
            api,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn inspector(&self) -> &StatusInspector {
        &self.inspector
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Loads the final report, stopping at the missing-report gate
    pub async fn load_all(&self, job_post_id: &str) -> Result<LoadOutcome, LoadError> {
        self.load(job_post_id, true).await
    }

    /// Loads the final report, fetching any absent or expired base report
    /// instead of stopping at the missing-report gate
    pub async fn force_load(&self, job_post_id: &str) -> Result<LoadOutcome, LoadError> {
        self.load(job_post_id, false).await
    }

    async fn load(&self, job_post_id: &str, gated: bool) -> Result<LoadOutcome, LoadError> {
        let final_key = CacheKey::new(ReportKind::Final, job_post_id)?;

        if let Some(report) = self.cached_final(&final_key) {
            debug!(job_post_id, "serving cached final report");
            return Ok(LoadOutcome::Ready {
                report,
                origin: ReportOrigin::Cached,
            });
        }

        if gated {
            let missing = self.inspector.status(job_post_id).missing_base_kinds();
            if !missing.is_empty() {
                info!(job_post_id, ?missing, "base reports missing, not assembling");
                return Ok(LoadOutcome::MissingReports(missing));
            }
        }

        let generation = self.generation(job_post_id);
        let (report, _) = self.assemble(&final_key, generation, false).await?;
        Ok(LoadOutcome::Ready {
            report,
            origin: ReportOrigin::Assembled,
        })
    }

    /// Refetches one report, bypassing its cache entry
    ///
    /// Refreshing a base report leaves the final report untouched. Refreshing
    /// the final report re-assembles it from cache-first base reports and
    /// fresh job posting metadata.
    pub async fn refresh_kind(
        &self,
        kind: ReportKind,
        job_post_id: &str,
    ) -> Result<CacheEntry, LoadError> {
        let key = CacheKey::new(kind, job_post_id)?;
        let generation = self.generation(job_post_id);

        let fetched = match kind {
            ReportKind::Document => self.api.document_report(job_post_id).await,
            ReportKind::Written => self.api.written_report(job_post_id).await,
            ReportKind::Interview => self.fetch_interview(job_post_id).await,
            ReportKind::Final => {
                let (_, entry) = self.assemble(&key, generation, false).await?;
                return Ok(entry);
            }
        };
        let payload = fetched.map_err(|source| LoadError::Fetch { kind, source })?;

        self.ensure_current(job_post_id, generation)?;
        let entry = self.store.put(&key, payload)?;
        info!(kind = %kind, job_post_id, "refreshed cached report");
        Ok(entry)
    }

    /// Clears the final report and rebuilds everything from the network
    ///
    /// Any load for the same job posting still in flight is superseded and
    /// will not write its results.
    pub async fn refresh_all(&self, job_post_id: &str) -> Result<CompositeFinalPayload, LoadError> {
        let final_key = CacheKey::new(ReportKind::Final, job_post_id)?;
        let generation = self.next_generation(job_post_id);

        self.store.delete(&final_key)?;
        let (report, _) = self.assemble(&final_key, generation, true).await?;
        info!(job_post_id, "refreshed all cached reports");
        Ok(report)
    }

    /// Returns the final entry's payload if it is fresh and well-formed
    fn cached_final(&self, key: &CacheKey) -> Option<CompositeFinalPayload> {
        let entry = self.store.get(key)?;
        if self.policy.is_expired(&entry, Utc::now()) {
            debug!(key = %key, "final report expired");
            return None;
        }
        match serde_json::from_value::<CompositeFinalPayload>(entry.payload) {
            Ok(report) if report.job_post_data.is_null() => {
                debug!(key = %key, "final report has no job post data");
                None
            }
            Ok(report) => Some(report),
            Err(e) => {
                warn!(key = %key, error = %e, "ignoring malformed final report");
                None
            }
        }
    }

    /// Builds and stores a new final report
    ///
    /// Base reports and job posting metadata are resolved concurrently. The
    /// final entry is only written when every section succeeded.
    async fn assemble(
        &self,
        final_key: &CacheKey,
        generation: u64,
        bypass_cache: bool,
    ) -> Result<(CompositeFinalPayload, CacheEntry), LoadError> {
        let job_post_id = final_key.job_post_id();
        let document_key = CacheKey::new(ReportKind::Document, job_post_id)?;
        let written_key = CacheKey::new(ReportKind::Written, job_post_id)?;
        let interview_key = CacheKey::new(ReportKind::Interview, job_post_id)?;

        let (job_post, document, written, interview) = futures::join!(
            self.api.job_post(job_post_id),
            self.resolve(
                &document_key,
                generation,
                bypass_cache,
                self.api.document_report(job_post_id),
            ),
            self.resolve(
                &written_key,
                generation,
                bypass_cache,
                self.api.written_report(job_post_id),
            ),
            self.resolve(
                &interview_key,
                generation,
                bypass_cache,
                self.fetch_interview(job_post_id),
            ),
        );

        let (job_post_data, document_data, written_test_data, interview_data) =
            match (job_post, document, written, interview) {
                (Ok(job_post), Ok(document), Ok(written), Ok(interview)) => {
                    (job_post, document, written, interview)
                }
                (job_post, document, written, interview) => {
                    let failures: Vec<SectionFailure> = [
                        (Section::JobPost, job_post.err()),
                        (Section::Report(ReportKind::Document), document.err()),
                        (Section::Report(ReportKind::Written), written.err()),
                        (Section::Report(ReportKind::Interview), interview.err()),
                    ]
                    .into_iter()
                    .filter_map(|(section, error)| {
                        error.map(|error| SectionFailure { section, error })
                    })
                    .collect();
                    warn!(
                        job_post_id,
                        failures = %describe_failures(&failures),
                        "final report not assembled"
                    );
                    return Err(LoadError::Incomplete(failures));
                }
            };

        let report = CompositeFinalPayload {
            job_post_data,
            document_data,
            written_test_data,
            interview_data,
            // Stored with millisecond precision; match it so the cached copy
            // compares equal to the returned one.
            timestamp: Utc::now().trunc_subsecs(3),
        };

        self.ensure_current(job_post_id, generation)?;
        let payload = serde_json::to_value(&report).map_err(StorageError::from)?;
        let entry = self.store.put(final_key, payload)?;
        info!(job_post_id, "assembled final report");
        Ok((report, entry))
    }

    /// Serves a base report from the cache when fresh, otherwise fetches and
    /// stores it
    ///
    /// A failed cache write is logged; the fetched payload is still returned.
    async fn resolve<F>(
        &self,
        key: &CacheKey,
        generation: u64,
        bypass_cache: bool,
        fetch: F,
    ) -> Result<Value, FetchError>
    where
        F: Future<Output = Result<Value, FetchError>>,
    {
        if !bypass_cache {
            if let Some(entry) = self.store.get(key) {
                if !self.policy.is_expired(&entry, Utc::now()) {
                    debug!(key = %key, "cache hit");
                    return Ok(entry.payload);
                }
                debug!(key = %key, "cache entry expired");
            }
        }

        let payload = fetch.await?;

        if self.generation(key.job_post_id()) != generation {
            debug!(key = %key, "discarding superseded response");
        } else if let Err(e) = self.store.put(key, payload.clone()) {
            warn!(key = %key, error = %e, "failed to cache fetched report");
        }
        Ok(payload)
    }

    /// Fetches the four interview stages concurrently into one payload
    async fn fetch_interview(&self, job_post_id: &str) -> Result<Value, FetchError> {
        let (ai, practical, executive, final_selected) = futures::try_join!(
            self.api.interview_evaluations(InterviewStage::Ai, job_post_id),
            self.api.interview_evaluations(InterviewStage::Practical, job_post_id),
            self.api.interview_evaluations(InterviewStage::Executive, job_post_id),
            self.api.interview_evaluations(InterviewStage::FinalSelected, job_post_id),
        )?;

        Ok(InterviewPayload {
            ai,
            practical,
            executive,
            final_selected,
        }
        .into_value())
    }

    fn generation(&self, job_post_id: &str) -> u64 {
        let generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations.get(job_post_id).copied().unwrap_or(0)
    }

    fn next_generation(&self, job_post_id: &str) -> u64 {
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = generations.entry(job_post_id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn ensure_current(&self, job_post_id: &str, generation: u64) -> Result<(), LoadError> {
        if self.generation(job_post_id) == generation {
            Ok(())
        } else {
            Err(LoadError::Superseded {
                job_post_id: job_post_id.to_string(),
            })
        }
    }
}
