//! In-memory capability fakes shared by the unit tests.

use std::sync::{Arc, Mutex};

use ai_llm_service::AiLlmError;
use ai_llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};
use github_gateway::{GitHubError, PullRequestFile};

use crate::capabilities::{PullRequestFiles, ReviewModel};

pub fn file(name: &str, patch: Option<&str>) -> PullRequestFile {
    PullRequestFile {
        filename: name.to_string(),
        status: "modified".to_string(),
        additions: 1,
        deletions: 0,
        changes: 1,
        patch: patch.map(str::to_string),
        previous_filename: None,
        sha: None,
        blob_url: None,
    }
}

#[derive(Clone, Default)]
pub struct FakeGitHub {
    files: Option<Vec<PullRequestFile>>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl FakeGitHub {
    pub fn with_files(files: Vec<PullRequestFile>) -> Self {
        Self {
            files: Some(files),
            ..Self::default()
        }
    }

    /// Every call answers 502.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl PullRequestFiles for FakeGitHub {
    async fn list_files(
        &self,
        _repo_full_name: &str,
        _pr_number: u64,
        token: &str,
    ) -> Result<Vec<PullRequestFile>, GitHubError> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.files.clone().ok_or(GitHubError::Server(502))
    }
}

/// Answers review prompts with `review_reply` and summary prompts with
/// `summary_reply`, unless a marker in the prompt selects another behaviour.
#[derive(Clone)]
pub struct FakeModel {
    review_reply: String,
    summary_reply: String,
    overrides: Vec<(String, String)>,
    fail_markers: Vec<String>,
    hang_markers: Vec<String>,
    summary_calls: Arc<Mutex<usize>>,
}

impl FakeModel {
    pub fn new(review_reply: &str, summary_reply: &str) -> Self {
        Self {
            review_reply: review_reply.to_string(),
            summary_reply: summary_reply.to_string(),
            overrides: Vec::new(),
            fail_markers: Vec::new(),
            hang_markers: Vec::new(),
            summary_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_markers.push(marker.to_string());
        self
    }

    pub fn hanging_on(mut self, marker: &str) -> Self {
        self.hang_markers.push(marker.to_string());
        self
    }

    pub fn answering(mut self, marker: &str, reply: &str) -> Self {
        self.overrides.push((marker.to_string(), reply.to_string()));
        self
    }

    pub fn summary_calls(&self) -> usize {
        *self.summary_calls.lock().unwrap()
    }
}

impl ReviewModel for FakeModel {
    async fn complete(&self, prompt: &str, _api_key: Option<&str>) -> Result<String, AiLlmError> {
        if self.hang_markers.iter().any(|m| prompt.contains(m.as_str())) {
            std::future::pending::<()>().await;
        }
        if self.fail_markers.iter().any(|m| prompt.contains(m.as_str())) {
            let empty = ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices);
            return Err(empty.into());
        }
        if let Some((_, reply)) = self
            .overrides
            .iter()
            .find(|(m, _)| prompt.contains(m.as_str()))
        {
            return Ok(reply.clone());
        }
        if prompt.contains("retrospective of pull request") {
            *self.summary_calls.lock().unwrap() += 1;
            return Ok(self.summary_reply.clone());
        }
        Ok(self.review_reply.clone())
    }
}
