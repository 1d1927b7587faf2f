//! External capabilities the review pipeline depends on.
//!
//! Plain traits returning `impl Future + Send` (no async-trait, no trait
//! objects). The real clients implement them here; tests use in-memory fakes.

use std::future::Future;

use ai_llm_service::{AiLlmError, LlmService};
use github_gateway::{GitHubClient, GitHubError, PullRequestFile};

/// Lists the changed files of a pull request. Must fail on non-2xx.
pub trait PullRequestFiles: Send + Sync {
    fn list_files(
        &self,
        repo_full_name: &str,
        pr_number: u64,
        token: &str,
    ) -> impl Future<Output = Result<Vec<PullRequestFile>, GitHubError>> + Send;
}

/// Single-shot text completion.
pub trait ReviewModel: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        api_key: Option<&str>,
    ) -> impl Future<Output = Result<String, AiLlmError>> + Send;
}

impl PullRequestFiles for GitHubClient {
    async fn list_files(
        &self,
        repo_full_name: &str,
        pr_number: u64,
        token: &str,
    ) -> Result<Vec<PullRequestFile>, GitHubError> {
        self.list_pull_request_files(repo_full_name, pr_number, token)
            .await
    }
}

impl ReviewModel for LlmService {
    async fn complete(&self, prompt: &str, api_key: Option<&str>) -> Result<String, AiLlmError> {
        self.generate(prompt, api_key).await
    }
}
