use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::{debug, instrument};

use crate::{
    core::{app_state::AppState, credentials::github_credentials, http::response_envelope::ok},
    error_handler::AppResult,
    routes::repos::repos_response::{BranchesResponse, RepoSummary},
};

/// Repositories visible to the employee's token.
#[instrument(name = "user_repos_route", skip(state))]
pub async fn user_repos_route(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let repos = state.github.list_user_repos(&creds.token).await?;
    debug!(count = repos.len(), "repositories listed");

    Ok(ok(repos.into_iter().map(RepoSummary::from).collect::<Vec<_>>()))
}

#[instrument(name = "repo_branches_route", skip(state))]
pub async fn repo_branches_route(
    State(state): State<Arc<AppState>>,
    Path((user_id, owner, repo)): Path<(i64, String, String)>,
) -> AppResult<Response> {
    let creds = github_credentials(&state.store, user_id).await?;
    let full_name = format!("{owner}/{repo}");

    let info = state.github.get_repo(&full_name, &creds.token).await?;
    let branches = state.github.list_branches(&full_name, &creds.token).await?;

    Ok(ok(BranchesResponse::new(
        branches.into_iter().map(|b| b.name).collect(),
        info.default_branch,
    )))
}
