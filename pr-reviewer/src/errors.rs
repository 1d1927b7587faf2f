//! Error hierarchy for pr-reviewer.
//!
//! - [`ReviewError`]: terminal outcome of one PR review pass. Credential and
//!   file-listing problems are *aborts* (nothing to retry with the same
//!   inputs); lookup and persistence problems are *failures*.
//! - [`FileReviewError`]: isolated to one file or to the summary step; never
//!   ends the pass.
//! - [`EventError`]: webhook envelope handling.

use std::fmt;
use std::time::Duration;

use ai_llm_service::AiLlmError;
use feedback_store::StoreError;
use github_gateway::GitHubError;
use thiserror::Error;

use crate::normalize::DecodeError;

/// Where a review pass is, for logs and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    Start,
    TokenResolved,
    RecordEnsured,
    FilesFetched,
    PerFileReviewed,
    Summarized,
    Persisted,
    Aborted,
    Failed,
}

impl fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "START",
            Self::TokenResolved => "TOKEN_RESOLVED",
            Self::RecordEnsured => "RECORD_ENSURED",
            Self::FilesFetched => "FILES_FETCHED",
            Self::PerFileReviewed => "PER_FILE_REVIEWED",
            Self::Summarized => "SUMMARIZED",
            Self::Persisted => "PERSISTED",
            Self::Aborted => "ABORTED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Failure of a bounded call to GitHub or the model.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Neither the author nor the process has a GitHub token.
    #[error("no GitHub token for author '{author}' and no fallback token configured")]
    CredentialMissing { author: String },

    /// Employee or feedback-row lookup failed.
    #[error("feedback record lookup failed: {0}")]
    RecordLookup(#[source] StoreError),

    /// Listing PR files failed; nothing was written.
    #[error("listing pull request files failed: {0}")]
    FileFetch(#[source] CapabilityError),

    /// Final update failed and was rolled back.
    #[error("persisting review failed: {0}")]
    Persistence(#[source] StoreError),
}

impl ReviewError {
    /// `true` when the pass ended early without touching review data.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::CredentialMissing { .. } | Self::FileFetch(_))
    }

    pub fn terminal_stage(&self) -> ReviewStage {
        if self.is_abort() {
            ReviewStage::Aborted
        } else {
            ReviewStage::Failed
        }
    }

    /// Last stage reached before the error.
    pub fn last_stage(&self) -> ReviewStage {
        match self {
            Self::CredentialMissing { .. } => ReviewStage::Start,
            Self::RecordLookup(_) => ReviewStage::TokenResolved,
            Self::FileFetch(_) => ReviewStage::RecordEnsured,
            Self::Persistence(_) => ReviewStage::Summarized,
        }
    }
}

/// Why one file (or the summary) produced no feedback.
#[derive(Debug, Error)]
pub enum FileReviewError {
    #[error("model call failed: {0}")]
    Model(#[from] CapabilityError),

    #[error("model response rejected: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum EventError {
    /// The envelope itself could not be written.
    #[error("recording github event failed: {0}")]
    Record(#[source] StoreError),

    /// Dispatch failed; the envelope stays pending.
    #[error("processing github event {id} failed: {source}")]
    Dispatch {
        id: i64,
        #[source]
        source: DispatchError,
    },

    /// Work finished but the envelope could not be marked done.
    #[error("marking github event {id} done failed: {source}")]
    MarkDone {
        id: i64,
        #[source]
        source: StoreError,
    },
}

impl EventError {
    pub fn envelope_id(&self) -> Option<i64> {
        match self {
            Self::Record(_) => None,
            Self::Dispatch { id, .. } | Self::MarkDone { id, .. } => Some(*id),
        }
    }
}
