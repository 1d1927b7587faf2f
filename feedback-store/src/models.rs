//! Persisted records and the review payload shapes they carry.
//!
//! `ReviewComment` / `FileFeedback` / `RecommendedResource` serialize with the
//! exact JSON field names stored in the database and served to clients.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a diff line, as emitted by the parser and echoed back by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Insert,
    Delete,
    Normal,
}

impl LineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One review remark anchored to a diff line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    #[serde(rename = "type")]
    pub kind: LineKind,
    pub comment: String,
    #[serde(rename = "lineNumber")]
    pub line_number: u32,
}

/// Comments for one file. Never stored with an empty `comments` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFeedback {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub comments: Vec<ReviewComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedResource {
    pub title: String,
    pub link: String,
}

/// Overall assessment of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub summary: String,
    /// 0..=10
    pub quality: f64,
    #[serde(default)]
    pub recommended_resources: Vec<RecommendedResource>,
}

/// What a finished review run writes to its PR feedback row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub feedback: Vec<FileFeedback>,
    pub summary: Option<ReviewSummary>,
    pub analyzed_at: DateTime<Utc>,
}

/// Derived review state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetroLabel {
    NotAnalyzed,
    Analyzed,
    NoFeedback,
}

impl RetroLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAnalyzed => "not_analyzed",
            Self::Analyzed => "analyzed",
            Self::NoFeedback => "no_feedback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestFeedbackRecord {
    pub id: i64,
    pub github_repo_id: i64,
    pub pr_number: i64,
    pub repo_full_name: String,
    pub author: Option<String>,
    pub employee_id: Option<i64>,
    pub feedback: Vec<FileFeedback>,
    pub summary: Option<String>,
    pub quality: Option<f64>,
    pub recommended_resources: Vec<RecommendedResource>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl PullRequestFeedbackRecord {
    pub fn retro(&self) -> RetroLabel {
        match (self.analyzed_at, &self.summary) {
            (None, _) => RetroLabel::NotAnalyzed,
            (Some(_), Some(_)) => RetroLabel::Analyzed,
            (Some(_), None) => RetroLabel::NoFeedback,
        }
    }
}

/// Status written for commits as soon as a push is seen.
pub const COMMIT_STATUS_ANALYZING: &str = "analyzing";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitFeedbackRecord {
    pub id: i64,
    pub sha: String,
    pub repo_full_name: String,
    pub employee_id: Option<i64>,
    pub status: String,
    pub summary: Option<String>,
    pub feedback: Vec<FileFeedback>,
    pub quality: Option<f64>,
    pub recommended_resources: Vec<RecommendedResource>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a commit first seen in a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommitFeedback {
    pub sha: String,
    pub repo_full_name: String,
    pub employee_id: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Done,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }
}

/// Raw webhook delivery as recorded before processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GithubEventEnvelope {
    pub id: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Employee with optional GitHub credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: i64,
    pub github_username: Option<String>,
    pub github_token: Option<String>,
}

impl fmt::Debug for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Employee")
            .field("id", &self.id)
            .field("github_username", &self.github_username)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Per-employee aggregation for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub analyzed_prs: u64,
    pub pending_prs: u64,
    pub average_quality: Option<f64>,
    pub commits_by_status: BTreeMap<String, u64>,
    pub recent_reviews: Vec<PullRequestFeedbackRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_comment_uses_wire_field_names() {
        let c = ReviewComment {
            kind: LineKind::Insert,
            comment: "Prefer `?` here".into(),
            line_number: 12,
        };
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({ "type": "insert", "comment": "Prefer `?` here", "lineNumber": 12 })
        );

        let f = FileFeedback {
            file_path: "src/lib.rs".into(),
            comments: vec![c],
        };
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["filePath"], "src/lib.rs");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = json!({ "type": "added", "comment": "x", "lineNumber": 1 });
        assert!(serde_json::from_value::<ReviewComment>(raw).is_err());
    }

    #[test]
    fn retro_label_follows_analysis_state() {
        let mut rec = PullRequestFeedbackRecord {
            id: 1,
            github_repo_id: 10,
            pr_number: 2,
            repo_full_name: "acme/api".into(),
            author: None,
            employee_id: None,
            feedback: vec![],
            summary: None,
            quality: None,
            recommended_resources: vec![],
            created_at: Utc::now(),
            analyzed_at: None,
        };
        assert_eq!(rec.retro(), RetroLabel::NotAnalyzed);

        rec.analyzed_at = Some(Utc::now());
        assert_eq!(rec.retro(), RetroLabel::NoFeedback);

        rec.summary = Some("Solid change".into());
        assert_eq!(rec.retro(), RetroLabel::Analyzed);
    }

    #[test]
    fn employee_debug_hides_token() {
        let e = Employee {
            id: 1,
            github_username: Some("dev".into()),
            github_token: Some("ghp_secret".into()),
        };
        let s = format!("{e:?}");
        assert!(!s.contains("ghp_secret"));
        assert!(s.contains("<redacted>"));
    }
}
