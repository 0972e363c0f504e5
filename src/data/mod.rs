//! Report payloads and the Report Fetch API client
//!
//! Report bodies are kept as `serde_json::Value`: the cache stores and copies
//! them without interpreting their contents. Only the two payloads this crate
//! assembles itself have a fixed shape.

pub mod client;

pub use client::{Endpoint, FetchError, HttpReportApi, ReportApi};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four interview evaluation endpoints merged into one interview report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterviewStage {
    /// AI interview evaluations
    Ai,
    /// Practical (hands-on) interview evaluations
    Practical,
    /// Executive interview evaluations
    Executive,
    /// Applicants selected after the final interview
    FinalSelected,
}

impl InterviewStage {
    pub const ALL: [InterviewStage; 4] = [
        InterviewStage::Ai,
        InterviewStage::Practical,
        InterviewStage::Executive,
        InterviewStage::FinalSelected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStage::Ai => "ai",
            InterviewStage::Practical => "practical",
            InterviewStage::Executive => "executive",
            InterviewStage::FinalSelected => "final-selected",
        }
    }
}

/// Cached payload of the `interview` kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewPayload {
    pub ai: Value,
    pub practical: Value,
    pub executive: Value,
    #[serde(rename = "final")]
    pub final_selected: Value,
}

impl InterviewPayload {
    pub fn into_value(self) -> Value {
        serde_json::json!({
            "ai": self.ai,
            "practical": self.practical,
            "executive": self.executive,
            "final": self.final_selected,
        })
    }
}

/// Cached payload of the `final` kind
///
/// A self-contained snapshot: it holds copies of the other reports as they
/// were when it was assembled, not references to their cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFinalPayload {
    /// Job posting metadata, always fetched fresh at assembly time
    pub job_post_data: Value,
    pub document_data: Value,
    pub written_test_data: Value,
    pub interview_data: Value,
    /// When the snapshot was assembled
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}
