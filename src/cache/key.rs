//! Report kinds and cache keys
//!
//! A cache key pairs a [`ReportKind`] with a job posting id. Keys are encoded
//! into storage names as `report.<kind>.<hex id>` so that no combination of
//! kind and id can produce the same name as another.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix shared by every encoded report key
const KEY_PREFIX: &str = "report";

/// Separator between key segments. Never appears in a kind slug or a hex id.
const KEY_SEPARATOR: char = '.';

/// The four categories of cached hiring reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Document screening report
    Document,
    /// Written (job aptitude) test report
    Written,
    /// Merged interview evaluations
    Interview,
    /// Composite snapshot of all other kinds
    Final,
}

impl ReportKind {
    /// Every kind, in display order
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Document,
        ReportKind::Written,
        ReportKind::Interview,
        ReportKind::Final,
    ];

    /// The kinds a final report is assembled from
    pub const BASE: [ReportKind; 3] = [
        ReportKind::Document,
        ReportKind::Written,
        ReportKind::Interview,
    ];

    /// Stable slug used in storage keys and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Document => "document",
            ReportKind::Written => "written",
            ReportKind::Interview => "interview",
            ReportKind::Final => "final",
        }
    }

    /// Human-readable name shown when a report needs attention
    pub fn display_name(&self) -> &'static str {
        match self {
            ReportKind::Document => "document report",
            ReportKind::Written => "written-test report",
            ReportKind::Interview => "interview report",
            ReportKind::Final => "final report",
        }
    }

    /// Whether this kind is one of the inputs to the final report
    pub fn is_base(&self) -> bool {
        !matches!(self, ReportKind::Final)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Errors produced when decoding a storage name back into a key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The kind segment is not a known report kind
    #[error("unknown report kind: '{0}'")]
    UnknownKind(String),

    /// The name does not follow the `report.<kind>.<hex id>` layout
    #[error("malformed cache key: '{0}'")]
    Malformed(String),

    /// Job posting ids must not be empty
    #[error("job post id must not be empty")]
    EmptyJobPostId,
}

/// Identifies at most one cached report: one kind for one job posting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ReportKind,
    job_post_id: String,
}

impl CacheKey {
    /// Builds a key, rejecting empty job posting ids
    pub fn new(kind: ReportKind, job_post_id: impl Into<String>) -> Result<Self, KeyError> {
        let job_post_id = job_post_id.into();
        if job_post_id.is_empty() {
            return Err(KeyError::EmptyJobPostId);
        }
        Ok(Self { kind, job_post_id })
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn job_post_id(&self) -> &str {
        &self.job_post_id
    }

    /// Encodes the key into a storage-safe name
    ///
    /// The id is hex-encoded so the result only contains `[a-z0-9.]` and
    /// every distinct `(kind, id)` pair maps to a distinct name.
    pub fn encode(&self) -> String {
        let mut hex = String::with_capacity(self.job_post_id.len() * 2);
        for byte in self.job_post_id.as_bytes() {
            hex.push_str(&format!("{:02x}", byte));
        }
        format!(
            "{}{sep}{}{sep}{}",
            KEY_PREFIX,
            self.kind.as_str(),
            hex,
            sep = KEY_SEPARATOR
        )
    }

    /// Parses a name produced by [`CacheKey::encode`]
    pub fn decode(encoded: &str) -> Result<Self, KeyError> {
        let malformed = || KeyError::Malformed(encoded.to_string());

        let mut parts = encoded.split(KEY_SEPARATOR);
        let (Some(prefix), Some(kind), Some(hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if prefix != KEY_PREFIX {
            return Err(malformed());
        }
        // Only the canonical lowercase slug round-trips.
        let kind = ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| KeyError::UnknownKind(kind.to_string()))?;

        if hex.len() % 2 != 0 || hex.bytes().any(|b| !matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(malformed());
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| malformed())?;
        let job_post_id = String::from_utf8(bytes).map_err(|_| malformed())?;

        Self::new(kind, job_post_id)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.job_post_id)
    }
}
