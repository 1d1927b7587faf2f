use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::{AppError, AppResult},
};

/// Review aggregates of one employee. No GitHub call is made.
#[instrument(name = "dashboard_route", skip(state))]
pub async fn dashboard_route(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    state
        .store
        .find_employee(user_id)
        .await?
        .ok_or(AppError::NotFound("employee not found"))?;

    let stats = state.store.dashboard(user_id).await?;
    Ok(ok(stats))
}
