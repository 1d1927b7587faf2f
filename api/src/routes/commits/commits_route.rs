use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    core::{app_state::AppState, credentials::github_credentials, http::response_envelope::ok},
    error_handler::AppResult,
    routes::commits::commits_response::{CommitFeedbackView, group_commits},
};

#[derive(Debug, Deserialize)]
pub struct CommitsQuery {
    pub branch: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitFeedbackQuery {
    /// Shown in the view only; defaults to `main`.
    #[serde(default)]
    pub branch: Option<String>,
}

/// The employee's commits on `branch`, grouped by day.
#[instrument(name = "grouped_commits_route", skip(state))]
pub async fn grouped_commits_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, owner, repo)): Path<(i64, String, String)>,
    Query(query): Query<CommitsQuery>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let full_name = format!("{owner}/{repo}");

    let commits = state
        .github
        .list_commits(&full_name, &query.branch, &creds.token)
        .await?;
    let shas: Vec<String> = commits.iter().map(|c| c.sha.clone()).collect();

    // Badges only; a store hiccup shows commits as not analyzed.
    let statuses = state.store.commit_statuses(&shas).await.unwrap_or_else(|e| {
        warn!(error = %e, "commit status lookup failed");
        HashMap::new()
    });

    let groups = group_commits(&commits, &creds.username, &query.branch, &statuses, Utc::now());
    debug!(fetched = commits.len(), groups = groups.len(), "commits grouped");
    Ok(ok(groups))
}

#[instrument(name = "commit_feedback_route", skip(state))]
pub async fn commit_feedback_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, owner, repo, sha)): Path<(i64, String, String, String)>,
    Query(query): Query<CommitFeedbackQuery>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let full_name = format!("{owner}/{repo}");

    let detail = state.github.get_commit(&full_name, &sha, &creds.token).await?;
    let record = state.store.find_commit_feedback(&sha).await?;
    let branch = query.branch.as_deref().unwrap_or("main");

    Ok(ok(CommitFeedbackView::new(detail, record, branch)))
}
