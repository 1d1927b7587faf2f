//! Pull request review pass.
//!
//! Flow (one pass per `pull_request` event):
//!   1) resolve a GitHub token for the author (employee token, else fallback)
//!   2) ensure the `(repo, pr)` feedback row exists (placeholder committed now)
//!   3) list changed files
//!   4) per file, in order: parse → prompt → model → clean → decode
//!   5) summary over all file feedback (only when there is some)
//!   6) overwrite the row in one transaction
//!
//! Steps 4 and 5 never end the pass: a failing file is dropped from the
//! aggregate, a failing summary leaves the summary unset.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use feedback_store::{FeedbackStore, FileFeedback, ReviewOutcome, ReviewSummary};
use github_gateway::PullRequestFile;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{PullRequestFiles, ReviewModel};
use crate::diff;
use crate::errors::{CapabilityError, FileReviewError, ReviewError, ReviewStage};
use crate::normalize::{clean, decode_comments, decode_summary};
use crate::prompt::{build_review_prompt, build_summary_prompt};

/// Explicit pipeline configuration, built once at startup.
#[derive(Clone)]
pub struct ReviewConfig {
    /// Used when the PR author has no employee token.
    pub fallback_github_token: Option<String>,
    /// Passed to the model on every call; `None` uses the model's own default.
    pub llm_api_key: Option<String>,
    /// Upper bound for every GitHub / model call.
    pub call_timeout: Duration,
}

impl std::fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("fallback_github_token", &self.fallback_github_token.is_some())
            .field("llm_api_key", &self.llm_api_key.is_some())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            fallback_github_token: None,
            llm_api_key: None,
            call_timeout: Duration::from_secs(120),
        }
    }
}

/// The pull request a pass is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub github_repo_id: i64,
    pub repo_full_name: String,
    pub number: u64,
    /// GitHub login of the PR author.
    pub author: String,
}

/// Why a file did not contribute feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Binary or oversized file: GitHub sent no patch.
    NoPatch,
    /// Patch had no hunk lines.
    NoChangedLines,
    /// Model answered with no usable comments.
    NoComments,
}

/// Per-file result. Only `Reviewed` reaches the aggregate.
#[derive(Debug)]
pub enum FileReview {
    Reviewed(FileFeedback),
    Skipped(SkipReason),
    Failed(FileReviewError),
}

/// Result of a persisted pass.
#[derive(Debug)]
pub struct ReviewReport {
    pub record_id: i64,
    pub outcome: ReviewOutcome,
    pub reviewed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Review pipeline bound to its capabilities and store.
pub struct ReviewPipeline<G, M> {
    github: Arc<G>,
    model: Arc<M>,
    store: FeedbackStore,
    cfg: ReviewConfig,
}

impl<G, M> Clone for ReviewPipeline<G, M> {
    fn clone(&self) -> Self {
        Self {
            github: Arc::clone(&self.github),
            model: Arc::clone(&self.model),
            store: self.store.clone(),
            cfg: self.cfg.clone(),
        }
    }
}

impl<G, M> ReviewPipeline<G, M>
where
    G: PullRequestFiles,
    M: ReviewModel,
{
    pub fn new(github: Arc<G>, model: Arc<M>, store: FeedbackStore, cfg: ReviewConfig) -> Self {
        Self {
            github,
            model,
            store,
            cfg,
        }
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }

    /// Runs one full pass for `pr`.
    ///
    /// # Errors
    /// See [`ReviewError`]; [`ReviewError::is_abort`] tells aborts from failures.
    #[instrument(skip_all, fields(repo = %pr.repo_full_name, pr = pr.number))]
    pub async fn review(&self, pr: &PullRequestRef) -> Result<ReviewReport, ReviewError> {
        let started = Instant::now();
        let mut stage = ReviewStage::Start;
        debug!(%stage, "review pass started");

        // 1) credential
        let employee = self
            .store
            .find_employee_by_github_username(&pr.author)
            .await
            .map_err(ReviewError::RecordLookup)?;
        let employee_id = employee.as_ref().map(|e| e.id);
        let token = employee
            .and_then(|e| e.github_token)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.cfg
                    .fallback_github_token
                    .clone()
                    .filter(|t| !t.trim().is_empty())
            })
            .ok_or_else(|| ReviewError::CredentialMissing {
                author: pr.author.clone(),
            })?;
        stage = ReviewStage::TokenResolved;
        debug!(%stage, has_employee = employee_id.is_some());

        // 2) placeholder row
        let (record_id, created) = self
            .store
            .ensure_pr_feedback(pr.github_repo_id, pr.number as i64, &pr.repo_full_name)
            .await
            .map_err(ReviewError::RecordLookup)?;
        stage = ReviewStage::RecordEnsured;
        debug!(%stage, record_id, created);

        // 3) files
        let files = self
            .bounded(self.github.list_files(&pr.repo_full_name, pr.number, &token))
            .await
            .map_err(ReviewError::FileFetch)?;
        stage = ReviewStage::FilesFetched;
        debug!(%stage, files = files.len());

        // 4) per file
        let mut feedback = Vec::new();
        let (mut skipped, mut failed) = (0usize, 0usize);
        for file in &files {
            match self.review_file(file).await {
                FileReview::Reviewed(fb) => feedback.push(fb),
                FileReview::Skipped(reason) => {
                    debug!(file = %file.filename, ?reason, "file skipped");
                    skipped += 1;
                }
                FileReview::Failed(err) => {
                    warn!(file = %file.filename, error = %err, "file review failed");
                    failed += 1;
                }
            }
        }
        stage = ReviewStage::PerFileReviewed;
        debug!(%stage, reviewed = feedback.len(), skipped, failed);

        // 5) summary
        let summary = if feedback.is_empty() {
            None
        } else {
            let changed: u64 = files.iter().map(|f| f.additions + f.deletions).sum();
            match self.summarize(pr, &feedback, changed).await {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!(error = %err, "summary generation failed");
                    None
                }
            }
        };
        stage = ReviewStage::Summarized;
        debug!(%stage, has_summary = summary.is_some());

        // 6) persist
        let outcome = ReviewOutcome {
            feedback,
            summary,
            analyzed_at: Utc::now(),
        };
        self.store
            .save_pr_review(record_id, &pr.author, employee_id, &outcome)
            .await
            .map_err(ReviewError::Persistence)?;
        stage = ReviewStage::Persisted;

        let reviewed = outcome.feedback.len();
        info!(
            %stage,
            record_id,
            reviewed,
            skipped,
            failed,
            elapsed_ms = started.elapsed().as_millis(),
            "pull request review persisted"
        );

        Ok(ReviewReport {
            record_id,
            outcome,
            reviewed,
            skipped,
            failed,
        })
    }

    async fn review_file(&self, file: &PullRequestFile) -> FileReview {
        let Some(patch) = file.patch.as_deref() else {
            return FileReview::Skipped(SkipReason::NoPatch);
        };
        let lines = diff::parse(patch);
        if lines.is_empty() {
            return FileReview::Skipped(SkipReason::NoChangedLines);
        }

        let prompt = build_review_prompt(&lines);
        let raw = match self.ask(&prompt).await {
            Ok(raw) => raw,
            Err(e) => return FileReview::Failed(e.into()),
        };
        let comments = match decode_comments(&clean(&raw)) {
            Ok(c) => c,
            Err(e) => return FileReview::Failed(e.into()),
        };

        if comments.is_empty() {
            return FileReview::Skipped(SkipReason::NoComments);
        }
        FileReview::Reviewed(FileFeedback {
            file_path: file.filename.clone(),
            comments,
        })
    }

    async fn summarize(
        &self,
        pr: &PullRequestRef,
        feedback: &[FileFeedback],
        changed_lines: u64,
    ) -> Result<ReviewSummary, FileReviewError> {
        let prompt = build_summary_prompt(
            &pr.repo_full_name,
            &format!("#{}", pr.number),
            feedback,
            changed_lines,
        );
        let raw = self.ask(&prompt).await?;
        Ok(decode_summary(&clean(&raw))?)
    }

    async fn ask(&self, prompt: &str) -> Result<String, CapabilityError> {
        self.bounded(self.model.complete(prompt, self.cfg.llm_api_key.as_deref()))
            .await
    }

    async fn bounded<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CapabilityError>
    where
        CapabilityError: From<E>,
    {
        match tokio::time::timeout(self.cfg.call_timeout, fut).await {
            Ok(res) => res.map_err(CapabilityError::from),
            Err(_) => Err(CapabilityError::Timeout(self.cfg.call_timeout)),
        }
    }
}
