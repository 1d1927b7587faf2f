use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use feedback_store::RetroLabel;
use tracing::{debug, instrument, warn};

use crate::{
    core::{app_state::AppState, credentials::github_credentials, http::response_envelope::ok},
    error_handler::AppResult,
    routes::pulls::pulls_response::{PullFeedbackView, PullRequestItem},
};

/// Pull requests the employee authored or was asked to review.
#[instrument(name = "user_pulls_route", skip(state))]
pub async fn user_pulls_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, owner, repo)): Path<(i64, String, String)>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let full_name = format!("{owner}/{repo}");

    let prs = state.github.list_pull_requests(&full_name, &creds.token).await?;

    let repo_id = prs
        .first()
        .and_then(|p| p.base.repo.as_ref())
        .map(|r| r.id as i64);
    let retro = match repo_id {
        Some(id) => {
            let numbers: Vec<i64> = prs.iter().map(|p| p.number as i64).collect();
            // Badges only; a store hiccup shows PRs as not analyzed.
            state.store.retro_labels(id, &numbers).await.unwrap_or_else(|e| {
                warn!(error = %e, "retro label lookup failed");
                HashMap::new()
            })
        }
        None => HashMap::new(),
    };

    let now = Utc::now();
    let mut items = Vec::new();
    for pr in &prs {
        let is_author = pr.user.login == creds.username;
        let is_reviewer = !is_author
            && match state
                .github
                .requested_reviewers(&full_name, pr.number, &creds.token)
                .await
            {
                Ok(logins) => logins.iter().any(|l| *l == creds.username),
                Err(e) => {
                    debug!(pr = pr.number, error = %e, "requested reviewers unavailable");
                    false
                }
            };
        if !(is_author || is_reviewer) {
            continue;
        }

        let label = retro
            .get(&(pr.number as i64))
            .copied()
            .unwrap_or(RetroLabel::NotAnalyzed);
        items.push(PullRequestItem::new(pr, label, now));
    }

    debug!(fetched = prs.len(), listed = items.len(), "pull requests filtered");
    Ok(ok(items))
}

#[instrument(name = "pull_feedback_route", skip(state))]
pub async fn pull_feedback_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, owner, repo, number)): Path<(i64, String, String, u64)>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let full_name = format!("{owner}/{repo}");

    let pr = state.github.get_pull_request(&full_name, number, &creds.token).await?;
    let files = state
        .github
        .list_pull_request_files(&full_name, number, &creds.token)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "pull request files unavailable");
            Vec::new()
        });

    let record = match pr.base.repo.as_ref() {
        Some(r) => state.store.find_pr_feedback(r.id as i64, number as i64).await?,
        None => None,
    };

    Ok(ok(PullFeedbackView::new(pr, files, record, Utc::now())))
}
