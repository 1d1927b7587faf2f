//! Webhook envelope lifecycle: record → dispatch → mark done.
//!
//! The envelope is committed before any work starts and marked `done` only
//! after dispatch returns. A dispatch error leaves it `pending` and is handed
//! back to the HTTP layer; there is no retry loop.

use feedback_store::{COMMIT_STATUS_ANALYZING, FeedbackStore, NewCommitFeedback};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{PullRequestFiles, ReviewModel};
use crate::errors::{DispatchError, EventError};
use crate::payload::{PullRequestEvent, PushEvent};
use crate::review::{PullRequestRef, ReviewPipeline};

pub const PUSH_EVENT: &str = "push";
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// What dispatch did with an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Recorded only (unhandled event type or action).
    Ignored,
    /// Push: `inserted` new commit rows out of `total` distinct commits.
    CommitsRecorded { inserted: usize, total: usize },
    /// PR review persisted.
    Reviewed {
        record_id: i64,
        reviewed: usize,
        skipped: usize,
        failed: usize,
    },
    /// PR review ended early; retrying with the same inputs cannot succeed.
    Aborted { reason: String },
}

/// Result of a handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReceipt {
    pub envelope_id: i64,
    pub outcome: DispatchOutcome,
}

pub struct EventDispatcher<G, M> {
    store: FeedbackStore,
    pipeline: ReviewPipeline<G, M>,
}

impl<G, M> Clone for EventDispatcher<G, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<G, M> EventDispatcher<G, M>
where
    G: PullRequestFiles,
    M: ReviewModel,
{
    /// The dispatcher writes envelopes through the pipeline's store.
    pub fn new(pipeline: ReviewPipeline<G, M>) -> Self {
        Self {
            store: pipeline.store().clone(),
            pipeline,
        }
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }

    /// Records the envelope, dispatches by `event_type`, then marks it done.
    #[instrument(skip(self, payload))]
    pub async fn handle(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> Result<EventReceipt, EventError> {
        let id = self
            .store
            .record_event(event_type, payload)
            .await
            .map_err(EventError::Record)?;
        debug!(envelope_id = id, "github event recorded");

        let outcome = self
            .dispatch(event_type, payload)
            .await
            .map_err(|source| EventError::Dispatch { id, source })?;

        self.store
            .mark_event_done(id)
            .await
            .map_err(|source| EventError::MarkDone { id, source })?;
        info!(envelope_id = id, ?outcome, "github event processed");

        Ok(EventReceipt {
            envelope_id: id,
            outcome,
        })
    }

    async fn dispatch(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        match event_type {
            PUSH_EVENT => self.on_push(decode(PUSH_EVENT, payload)?).await,
            PULL_REQUEST_EVENT => self.on_pull_request(decode(PULL_REQUEST_EVENT, payload)?).await,
            other => {
                debug!(event_type = other, "no handler for event type");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    async fn on_push(&self, ev: PushEvent) -> Result<DispatchOutcome, DispatchError> {
        let employee_id = match ev.actor() {
            Some(login) => self
                .store
                .find_employee_by_github_username(login)
                .await?
                .map(|e| e.id),
            None => None,
        };

        let commits = ev.distinct_commits();
        let total = commits.len();
        let mut inserted = 0;
        for c in commits {
            let written = self
                .store
                .insert_commit_feedback(&NewCommitFeedback {
                    sha: c.id.clone(),
                    repo_full_name: ev.repository.full_name.clone(),
                    employee_id,
                    status: COMMIT_STATUS_ANALYZING.to_string(),
                })
                .await?;
            if written {
                inserted += 1;
            } else {
                debug!(sha = %c.id, "commit already tracked");
            }
        }

        info!(
            repo = %ev.repository.full_name,
            branch = ev.git_ref.as_deref().unwrap_or("-"),
            inserted,
            total,
            "push commits recorded"
        );
        Ok(DispatchOutcome::CommitsRecorded { inserted, total })
    }

    async fn on_pull_request(
        &self,
        ev: PullRequestEvent,
    ) -> Result<DispatchOutcome, DispatchError> {
        if !ev.triggers_review() {
            debug!(action = %ev.action, "pull request action does not trigger a review");
            return Ok(DispatchOutcome::Ignored);
        }

        let pr = PullRequestRef {
            github_repo_id: ev.repository.id,
            repo_full_name: ev.repository.full_name,
            number: ev.pull_request.number,
            author: ev.pull_request.user.login,
        };

        match self.pipeline.review(&pr).await {
            Ok(report) => Ok(DispatchOutcome::Reviewed {
                record_id: report.record_id,
                reviewed: report.reviewed,
                skipped: report.skipped,
                failed: report.failed,
            }),
            Err(err) if err.is_abort() => {
                warn!(
                    stage = %err.terminal_stage(),
                    after = %err.last_stage(),
                    error = %err,
                    "pull request review aborted"
                );
                Ok(DispatchOutcome::Aborted {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn decode<T: DeserializeOwned>(event: &'static str, payload: &Value) -> Result<T, DispatchError> {
    T::deserialize(payload).map_err(|source| DispatchError::Payload { event, source })
}
