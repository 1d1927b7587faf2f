use chrono::{DateTime, Utc};
use feedback_store::{FileFeedback, PullRequestFeedbackRecord, RecommendedResource, RetroLabel};
use github_gateway::{PullRequest, PullRequestFile};
use serde::Serialize;

use crate::{
    core::{
        dates::{relative_day, short_date},
        file_tree::{FileTreeNode, build_file_tree},
    },
    routes::commits::commits_response::ChangeStats,
};

pub const PR_NOT_ANALYZED_SUMMARY: &str = "This pull request has not been analyzed yet.";

/// `merged` when merged, `closed` when closed unmerged, else `open`, with
/// the matching relative date label (`merged yesterday`, `open 3 days ago`).
pub fn pr_status(pr: &PullRequest, now: DateTime<Utc>) -> (&'static str, String) {
    let (status, at) = match (pr.merged_at, pr.closed_at) {
        (Some(m), _) => ("merged", m),
        (None, Some(c)) => ("closed", c),
        (None, None) => ("open", pr.created_at),
    };
    (status, format!("{status} {}", relative_day(at, now)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestItem {
    pub title: String,
    pub number: u64,
    pub author: String,
    pub date: String,
    pub status: &'static str,
    pub retro: RetroLabel,
    pub comments: u64,
}

impl PullRequestItem {
    pub fn new(pr: &PullRequest, retro: RetroLabel, now: DateTime<Utc>) -> Self {
        let (status, date) = pr_status(pr, now);
        Self {
            title: pr.title.clone(),
            number: pr.number,
            author: pr.user.login.clone(),
            date,
            status,
            retro,
            comments: pr.comments + pr.review_comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PullInfoView {
    pub title: String,
    pub date: String,
    pub author: String,
    pub avatar: String,
    pub branch_from: String,
    pub branch_to: String,
    pub created_at: Option<DateTime<Utc>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub quality: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PullFeedbackView {
    pub info: PullInfoView,
    pub stats: ChangeStats,
    pub summary: String,
    pub feedback: Vec<FileFeedback>,
    /// Same rule as the list view, see [`pr_status`].
    pub status: &'static str,
    pub retro: RetroLabel,
    pub recommended_resources: Vec<RecommendedResource>,
    pub files: Vec<PullRequestFile>,
    pub file_tree: Vec<FileTreeNode>,
}

impl PullFeedbackView {
    pub fn new(
        pr: PullRequest,
        files: Vec<PullRequestFile>,
        record: Option<PullRequestFeedbackRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        let (status, _) = pr_status(&pr, now);
        let retro = record.as_ref().map_or(RetroLabel::NotAnalyzed, |r| r.retro());
        let info = PullInfoView {
            title: pr.title,
            date: short_date(pr.created_at),
            author: pr.user.login,
            avatar: pr.user.avatar_url.unwrap_or_default(),
            branch_from: pr.head.ref_name,
            branch_to: pr.base.ref_name,
            created_at: record.as_ref().map(|r| r.created_at),
            analyzed_at: record.as_ref().and_then(|r| r.analyzed_at),
            quality: record.as_ref().and_then(|r| r.quality),
        };

        let (summary, feedback, recommended_resources) = match record {
            Some(r) => (
                r.summary.unwrap_or_else(|| PR_NOT_ANALYZED_SUMMARY.to_string()),
                r.feedback,
                r.recommended_resources,
            ),
            None => (PR_NOT_ANALYZED_SUMMARY.to_string(), Vec::new(), Vec::new()),
        };

        Self {
            info,
            stats: ChangeStats::from_files(&files),
            summary,
            feedback,
            status,
            retro,
            recommended_resources,
            file_tree: build_file_tree(&files),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn pr(extra: Value) -> PullRequest {
        let mut base = json!({
            "number": 7,
            "title": "Add retries",
            "state": "closed",
            "user": { "id": 1, "login": "dev", "avatar_url": "https://avatars/1" },
            "head": { "ref": "feature/retries", "sha": "h" },
            "base": { "ref": "main", "sha": "b", "repo": { "id": 42, "full_name": "acme/api" } },
            "created_at": "2025-07-01T10:00:00Z"
        });
        if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
            obj.extend(more.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn status_prefers_merged_over_closed() {
        let now: DateTime<Utc> = "2025-07-10T12:00:00Z".parse().unwrap();

        let merged = pr(json!({
            "merged_at": "2025-07-09T10:00:00Z",
            "closed_at": "2025-07-09T10:00:00Z"
        }));
        assert_eq!(pr_status(&merged, now), ("merged", "merged yesterday".to_string()));

        let closed = pr(json!({ "closed_at": "2025-07-10T08:00:00Z" }));
        assert_eq!(pr_status(&closed, now), ("closed", "closed today".to_string()));

        let open = pr(json!({ "state": "open" }));
        assert_eq!(pr_status(&open, now), ("open", "open 9 days ago".to_string()));
    }

    #[test]
    fn unanalyzed_view_has_default_summary() {
        let now: DateTime<Utc> = "2025-07-10T12:00:00Z".parse().unwrap();
        let view = PullFeedbackView::new(pr(json!({})), vec![], None, now);
        assert_eq!(view.summary, PR_NOT_ANALYZED_SUMMARY);
        assert_eq!(view.status, "open");
        assert_eq!(view.retro, RetroLabel::NotAnalyzed);
        assert_eq!(view.info.branch_from, "feature/retries");
        assert_eq!(view.info.branch_to, "main");
        assert_eq!(view.info.date, "Jul 01, 2025");
        assert_eq!(view.stats, ChangeStats::default());
    }

    #[test]
    fn detail_status_matches_list_status() {
        let now: DateTime<Utc> = "2025-07-10T12:00:00Z".parse().unwrap();
        let merged = pr(json!({
            "merged_at": "2025-07-09T10:00:00Z",
            "closed_at": "2025-07-09T10:00:00Z"
        }));

        let item = PullRequestItem::new(&merged, RetroLabel::NotAnalyzed, now);
        let view = PullFeedbackView::new(merged, vec![], None, now);
        assert_eq!(view.status, "merged");
        assert_eq!(view.status, item.status);
    }
}
