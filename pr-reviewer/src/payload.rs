//! Subset of GitHub webhook payloads the dispatcher reads.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// `pusher` carries the git identity, not necessarily a GitHub login.
#[derive(Debug, Clone, Deserialize)]
pub struct Pusher {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `push` event. `head_commit` is null for branch deletions.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub repository: RepositoryPayload,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub head_commit: Option<PushCommit>,
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    #[serde(default)]
    pub pusher: Option<Pusher>,
    #[serde(default)]
    pub sender: Option<Account>,
}

impl PushEvent {
    /// `head_commit` first, then `commits` in order, without duplicates.
    pub fn distinct_commits(&self) -> Vec<&PushCommit> {
        let mut out: Vec<&PushCommit> = Vec::new();
        for c in self.head_commit.iter().chain(self.commits.iter()) {
            if !out.iter().any(|seen| seen.id == c.id) {
                out.push(c);
            }
        }
        out
    }

    /// Login used to attribute the push to an employee.
    pub fn actor(&self) -> Option<&str> {
        self.sender
            .as_ref()
            .map(|s| s.login.as_str())
            .or_else(|| self.pusher.as_ref().map(|p| p.name.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    pub user: Account,
}

/// `pull_request` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequestPayload,
    pub repository: RepositoryPayload,
}

impl PullRequestEvent {
    /// Actions after which the diff may have changed.
    pub fn triggers_review(&self) -> bool {
        matches!(
            self.action.as_str(),
            "opened" | "reopened" | "synchronize" | "ready_for_review"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_commits_are_deduplicated_head_first() {
        let ev: PushEvent = serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "repository": { "id": 1, "full_name": "acme/api" },
            "head_commit": { "id": "c2", "message": "second" },
            "commits": [{ "id": "c1", "message": "first" }, { "id": "c2", "message": "second" }],
            "pusher": { "name": "Dev Eloper", "email": "dev@example.com" },
            "sender": { "login": "dev" }
        }))
        .unwrap();

        let ids: Vec<_> = ev.distinct_commits().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(ev.actor(), Some("dev"));
    }

    #[test]
    fn branch_deletion_has_no_commits() {
        let ev: PushEvent = serde_json::from_value(json!({
            "repository": { "id": 1, "full_name": "acme/api" },
            "head_commit": null,
            "commits": [],
            "pusher": { "name": "dev" }
        }))
        .unwrap();
        assert!(ev.distinct_commits().is_empty());
        assert_eq!(ev.actor(), Some("dev"));
    }

    #[test]
    fn review_triggering_actions() {
        let mut ev: PullRequestEvent = serde_json::from_value(json!({
            "action": "opened",
            "number": 3,
            "pull_request": { "number": 3, "user": { "login": "dev" } },
            "repository": { "id": 1, "full_name": "acme/api" }
        }))
        .unwrap();
        assert!(ev.triggers_review());
        ev.action = "labeled".into();
        assert!(!ev.triggers_review());
    }
}
