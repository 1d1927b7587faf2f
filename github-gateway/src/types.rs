//! GitHub REST v3 response shapes (subset).
//!
//! Types that the read API hands back to clients verbatim (files) derive
//! `Serialize` as well; the rest are decode-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account as embedded in PRs, commits and reviewer lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Repository as returned by `/repos/{owner}/{repo}` and `/user/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Repository reference nested in a PR branch ref.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoRef {
    pub id: u64,
    pub full_name: String,
}

/// `head` / `base` of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
    #[serde(default)]
    pub repo: Option<RepoRef>,
}

/// Pull request (list and detail endpoints share this shape).
///
/// `comments` / `review_comments` are only present on the detail endpoint
/// and default to zero otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub user: GitHubUser,
    pub head: BranchRef,
    pub base: BranchRef,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub review_comments: u64,
}

/// One changed file of a pull request or commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
    /// Absent for binary files and very large diffs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
}

/// `/pulls/{n}/requested_reviewers` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestedReviewers {
    #[serde(default)]
    pub users: Vec<GitHubUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Verification {
    #[serde(default)]
    pub verified: bool,
}

/// Git-level commit data (`commit` object inside a REST commit).
#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
    #[serde(default)]
    pub verification: Option<Verification>,
}

/// Entry of `/repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoCommit {
    pub sha: String,
    pub commit: CommitInfo,
    /// GitHub account linked to the commit author, when GitHub could match one.
    #[serde(default)]
    pub author: Option<GitHubUser>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub total: u64,
}

/// `/repos/{owner}/{repo}/commits/{sha}` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub author: Option<GitHubUser>,
    #[serde(default)]
    pub stats: Option<CommitStats>,
    #[serde(default)]
    pub files: Vec<PullRequestFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
}
