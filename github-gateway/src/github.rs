//! GitHub provider (REST v3) used by the review pipeline and the read API.
//!
//! Endpoints used:
//!   * GET /repos/{owner}/{repo}
//!   * GET /repos/{owner}/{repo}/branches
//!   * GET /repos/{owner}/{repo}/commits?sha={branch}
//!   * GET /repos/{owner}/{repo}/commits/{sha}
//!   * GET /repos/{owner}/{repo}/pulls?state=all
//!   * GET /repos/{owner}/{repo}/pulls/{number}
//!   * GET /repos/{owner}/{repo}/pulls/{number}/files
//!   * GET /repos/{owner}/{repo}/pulls/{number}/requested_reviewers
//!   * GET /user/repos
//!
//! Tokens are passed per call: the same client serves requests on behalf of
//! different employees.

use std::time::Duration;

use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::errors::{GitHubError, GitHubResult};
use crate::types::*;

/// Runtime configuration for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_api: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
}

impl GitHubClient {
    /// Builds a client with a stable user agent and the configured timeout.
    pub fn new(cfg: GitHubConfig) -> GitHubResult<Self> {
        debug!("Creating GitHubClient with base_api={}", cfg.base_api);

        let http = Client::builder()
            .user_agent("pr-retro-backend/0.1")
            .timeout(cfg.timeout)
            .build()?;

        Ok(Self {
            http,
            base_api: cfg.base_api.trim_end_matches('/').to_string(),
        })
    }

    /// Changed files of a pull request (first 100).
    ///
    /// Errors on any non-2xx status.
    #[instrument(skip(self, token))]
    pub async fn list_pull_request_files(
        &self,
        repo: &str,
        number: u64,
        token: &str,
    ) -> GitHubResult<Vec<PullRequestFile>> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/pulls/{number}/files", self.base_api);
        // Pagination beyond 100 files is not followed.
        self.get_json(&url, token, &[("per_page", "100")]).await
    }

    #[instrument(skip(self, token))]
    pub async fn get_pull_request(
        &self,
        repo: &str,
        number: u64,
        token: &str,
    ) -> GitHubResult<PullRequest> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/pulls/{number}", self.base_api);
        self.get_json(&url, token, &[]).await
    }

    /// All pull requests regardless of state (first 100).
    #[instrument(skip(self, token))]
    pub async fn list_pull_requests(
        &self,
        repo: &str,
        token: &str,
    ) -> GitHubResult<Vec<PullRequest>> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/pulls", self.base_api);
        self.get_json(&url, token, &[("state", "all"), ("per_page", "100")])
            .await
    }

    /// Logins of users whose review was requested on the PR.
    #[instrument(skip(self, token))]
    pub async fn requested_reviewers(
        &self,
        repo: &str,
        number: u64,
        token: &str,
    ) -> GitHubResult<Vec<String>> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!(
            "{}/repos/{owner}/{name}/pulls/{number}/requested_reviewers",
            self.base_api
        );
        let body: RequestedReviewers = self.get_json(&url, token, &[]).await?;
        Ok(body.users.into_iter().map(|u| u.login).collect())
    }

    /// Commits reachable from `branch` (first 100).
    #[instrument(skip(self, token))]
    pub async fn list_commits(
        &self,
        repo: &str,
        branch: &str,
        token: &str,
    ) -> GitHubResult<Vec<RepoCommit>> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/commits", self.base_api);
        self.get_json(&url, token, &[("sha", branch), ("per_page", "100")])
            .await
    }

    #[instrument(skip(self, token))]
    pub async fn get_commit(
        &self,
        repo: &str,
        sha: &str,
        token: &str,
    ) -> GitHubResult<CommitDetail> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/commits/{sha}", self.base_api);
        self.get_json(&url, token, &[]).await
    }

    #[instrument(skip(self, token))]
    pub async fn list_branches(&self, repo: &str, token: &str) -> GitHubResult<Vec<Branch>> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}/branches", self.base_api);
        self.get_json(&url, token, &[]).await
    }

    #[instrument(skip(self, token))]
    pub async fn get_repo(&self, repo: &str, token: &str) -> GitHubResult<Repository> {
        let (owner, name) = split_owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{name}", self.base_api);
        self.get_json(&url, token, &[]).await
    }

    /// Repositories visible to the token owner (first 100).
    #[instrument(skip(self, token))]
    pub async fn list_user_repos(&self, token: &str) -> GitHubResult<Vec<Repository>> {
        let url = format!("{}/user/repos", self.base_api);
        self.get_json(&url, token, &[("per_page", "100")]).await
    }

    /* --------------------- Internals --------------------- */

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> GitHubResult<T> {
        debug!("GitHub GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            warn!(%status, %url, "GitHub returned non-success status");
            return Err(GitHubError::from_status(status, retry_after));
        }

        Ok(resp.json::<T>().await?)
    }
}

/// Splits "owner/repo" into components or returns a validation error.
pub fn split_owner_repo(project: &str) -> GitHubResult<(&str, &str)> {
    let mut parts = project.split('/');
    let owner = parts.next().unwrap_or("").trim();
    let repo = parts.next().unwrap_or("").trim();

    if owner.is_empty() || repo.is_empty() || parts.next().is_some() {
        return Err(GitHubError::Validation(format!(
            "invalid GitHub repository '{project}', expected 'owner/repo'"
        )));
    }

    Ok((owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            base_api: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn owner_repo_validation() {
        assert_eq!(split_owner_repo("acme/api").unwrap(), ("acme", "api"));
        assert!(split_owner_repo("acme").is_err());
        assert!(split_owner_repo("acme/api/extra").is_err());
        assert!(split_owner_repo("/api").is_err());
    }

    #[tokio::test]
    async fn lists_pr_files_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/pulls/7/files"))
            .and(query_param("per_page", "100"))
            .and(header_eq("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "filename": "src/a.rs", "status": "modified", "additions": 1,
                  "deletions": 0, "changes": 1, "patch": "@@ -1 +1,2 @@\n a\n+b" },
                { "filename": "logo.png", "status": "added", "additions": 0,
                  "deletions": 0, "changes": 0 }
            ])))
            .mount(&server)
            .await;

        let files = client(&server)
            .list_pull_request_files("acme/api", 7, "tok")
            .await
            .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "src/a.rs");
        assert!(files[0].patch.is_some());
        assert!(files[1].patch.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/pulls/7/files"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/pulls/8/files"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let c = client(&server);
        let err = c.list_pull_request_files("acme/api", 7, "t").await.unwrap_err();
        assert!(matches!(err, GitHubError::NotFound));

        let err = c.list_pull_request_files("acme/api", 8, "t").await.unwrap_err();
        assert!(matches!(
            err,
            GitHubError::RateLimited {
                retry_after_secs: Some(30)
            }
        ));
    }

    #[tokio::test]
    async fn pull_request_counts_default_to_zero_on_list_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/pulls"))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "number": 3,
                "title": "Add retries",
                "state": "closed",
                "user": { "id": 1, "login": "dev" },
                "head": { "ref": "feat", "sha": "h" },
                "base": { "ref": "main", "sha": "b", "repo": { "id": 99, "full_name": "acme/api" } },
                "created_at": "2025-01-01T10:00:00Z",
                "closed_at": "2025-01-02T10:00:00Z",
                "merged_at": "2025-01-02T10:00:00Z"
            }])))
            .mount(&server)
            .await;

        let prs = client(&server).list_pull_requests("acme/api", "t").await.unwrap();
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].comments, 0);
        assert!(prs[0].merged_at.is_some());
        assert_eq!(prs[0].base.repo.as_ref().map(|r| r.id), Some(99));
    }

    #[tokio::test]
    async fn requested_reviewers_returns_logins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/pulls/3/requested_reviewers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": 5, "login": "alice" }, { "id": 6, "login": "bob" }],
                "teams": []
            })))
            .mount(&server)
            .await;

        let logins = client(&server)
            .requested_reviewers("acme/api", 3, "t")
            .await
            .unwrap();
        assert_eq!(logins, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/api/branches"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).list_branches("acme/api", "t").await.unwrap_err();
        assert!(matches!(err, GitHubError::InvalidResponse(_)));
    }
}
