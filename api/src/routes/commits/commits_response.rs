use std::collections::HashMap;

use chrono::{DateTime, Utc};
use feedback_store::{CommitFeedbackRecord, FileFeedback, RecommendedResource};
use github_gateway::{CommitDetail, PullRequestFile, RepoCommit};
use serde::Serialize;

use crate::core::{
    dates::{human_date, relative_day, short_date},
    file_tree::{FileTreeNode, build_file_tree},
};

pub const NOT_ANALYZED: &str = "not_analyzed";
pub const COMMIT_NOT_ANALYZED_SUMMARY: &str = "This commit has not been analyzed yet.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitItem {
    pub message: String,
    pub author: String,
    /// Relative day label.
    pub date: String,
    pub hash: String,
    pub verified: bool,
    pub branch: String,
    pub status: String,
}

/// Commits of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitGroup {
    /// `July 04, 2025`
    pub date: String,
    pub commits: Vec<CommitItem>,
}

/// Groups `commits` authored by `username` by calendar day, keeping the
/// GitHub order (newest first) for both groups and entries.
///
/// A commit belongs to the user when either the linked GitHub login or the
/// git author name equals `username`.
pub fn group_commits(
    commits: &[RepoCommit],
    username: &str,
    branch: &str,
    statuses: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Vec<CommitGroup> {
    let mut groups: Vec<CommitGroup> = Vec::new();

    for c in commits {
        let login = c.author.as_ref().map(|a| a.login.as_str());
        let Some(git_author) = c.commit.author.as_ref() else {
            continue;
        };
        if login != Some(username) && git_author.name != username {
            continue;
        }

        let item = CommitItem {
            message: c.commit.message.clone(),
            author: login.unwrap_or(&git_author.name).to_string(),
            date: relative_day(git_author.date, now),
            hash: c.sha.clone(),
            verified: c.commit.verification.as_ref().is_some_and(|v| v.verified),
            branch: branch.to_string(),
            status: statuses
                .get(&c.sha)
                .cloned()
                .unwrap_or_else(|| NOT_ANALYZED.to_string()),
        };

        let key = human_date(git_author.date);
        match groups.iter_mut().find(|g| g.date == key) {
            Some(g) => g.commits.push(item),
            None => groups.push(CommitGroup {
                date: key,
                commits: vec![item],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    pub files_changed: usize,
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

impl ChangeStats {
    /// Sums the per-file counters.
    pub fn from_files(files: &[PullRequestFile]) -> Self {
        let additions: u64 = files.iter().map(|f| f.additions).sum();
        let deletions: u64 = files.iter().map(|f| f.deletions).sum();
        Self {
            files_changed: files.len(),
            additions,
            deletions,
            total: additions + deletions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommitInfoView {
    /// First line of the message.
    pub title: String,
    pub date: String,
    pub author: String,
    pub avatar: String,
    pub branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub quality: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CommitFeedbackView {
    pub info: CommitInfoView,
    pub stats: ChangeStats,
    pub summary: String,
    pub feedback: Vec<FileFeedback>,
    pub status: String,
    pub recommended_resources: Vec<RecommendedResource>,
    pub files: Vec<PullRequestFile>,
    pub file_tree: Vec<FileTreeNode>,
}

impl CommitFeedbackView {
    /// Merges GitHub's commit with the stored feedback row, if any.
    pub fn new(detail: CommitDetail, record: Option<CommitFeedbackRecord>, branch: &str) -> Self {
        let git_author = detail.commit.author.as_ref();
        let stats = match detail.stats {
            Some(s) => ChangeStats {
                files_changed: detail.files.len(),
                additions: s.additions,
                deletions: s.deletions,
                total: s.total,
            },
            None => ChangeStats::from_files(&detail.files),
        };

        let info = CommitInfoView {
            title: detail.commit.message.lines().next().unwrap_or_default().to_string(),
            date: git_author.map(|a| short_date(a.date)).unwrap_or_default(),
            author: git_author.map(|a| a.name.clone()).unwrap_or_default(),
            avatar: detail
                .author
                .as_ref()
                .and_then(|a| a.avatar_url.clone())
                .unwrap_or_default(),
            branch: branch.to_string(),
            created_at: record.as_ref().map(|r| r.created_at),
            analyzed_at: record.as_ref().and_then(|r| r.analyzed_at),
            quality: record.as_ref().and_then(|r| r.quality),
        };

        let file_tree = build_file_tree(&detail.files);
        let (summary, feedback, status, recommended_resources) = match record {
            Some(r) => (
                r.summary.unwrap_or_else(|| COMMIT_NOT_ANALYZED_SUMMARY.to_string()),
                r.feedback,
                r.status,
                r.recommended_resources,
            ),
            None => (
                COMMIT_NOT_ANALYZED_SUMMARY.to_string(),
                Vec::new(),
                NOT_ANALYZED.to_string(),
                Vec::new(),
            ),
        };

        Self {
            info,
            stats,
            summary,
            feedback,
            status,
            recommended_resources,
            files: detail.files,
            file_tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-07-10T12:00:00Z".parse().unwrap()
    }

    fn commits() -> Vec<RepoCommit> {
        serde_json::from_value(json!([
            {
                "sha": "c3",
                "commit": { "message": "third", "author": { "name": "Dev", "date": "2025-07-10T09:00:00Z" },
                            "verification": { "verified": true } },
                "author": { "id": 1, "login": "dev" }
            },
            {
                "sha": "c2",
                "commit": { "message": "by someone else", "author": { "name": "Other", "date": "2025-07-10T08:00:00Z" } },
                "author": { "id": 2, "login": "other" }
            },
            {
                "sha": "c1",
                "commit": { "message": "first", "author": { "name": "dev", "date": "2025-07-08T08:00:00Z" } },
                "author": null
            }
        ]))
        .unwrap()
    }

    #[test]
    fn groups_only_the_users_commits_by_day() {
        let statuses = HashMap::from([("c3".to_string(), "analyzing".to_string())]);
        let groups = group_commits(&commits(), "dev", "main", &statuses, now());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, "July 10, 2025");
        assert_eq!(groups[0].commits.len(), 1);

        let head = &groups[0].commits[0];
        assert_eq!(head.hash, "c3");
        assert_eq!(head.date, "today");
        assert_eq!(head.status, "analyzing");
        assert!(head.verified);

        let old = &groups[1].commits[0];
        assert_eq!(groups[1].date, "July 08, 2025");
        assert_eq!(old.author, "dev");
        assert_eq!(old.date, "2 days ago");
        assert_eq!(old.status, NOT_ANALYZED);
        assert!(!old.verified);
    }

    #[test]
    fn unanalyzed_commit_view_uses_sentinels() {
        let detail: CommitDetail = serde_json::from_value(json!({
            "sha": "c9",
            "commit": { "message": "Fix parser\n\nLonger body", "author": { "name": "Dev", "date": "2025-07-04T10:00:00Z" } },
            "author": { "id": 1, "login": "dev", "avatar_url": "https://avatars/1" },
            "stats": { "additions": 3, "deletions": 1, "total": 4 },
            "files": [{ "filename": "src/parser.rs", "status": "modified", "additions": 3, "deletions": 1, "changes": 4 }]
        }))
        .unwrap();

        let view = CommitFeedbackView::new(detail, None, "main");
        assert_eq!(view.info.title, "Fix parser");
        assert_eq!(view.info.date, "Jul 04, 2025");
        assert_eq!(view.info.avatar, "https://avatars/1");
        assert_eq!(view.summary, COMMIT_NOT_ANALYZED_SUMMARY);
        assert_eq!(view.status, NOT_ANALYZED);
        assert_eq!(
            view.stats,
            ChangeStats {
                files_changed: 1,
                additions: 3,
                deletions: 1,
                total: 4
            }
        );
        assert_eq!(view.file_tree.len(), 1);
    }
}
