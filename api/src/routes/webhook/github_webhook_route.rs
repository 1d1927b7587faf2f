use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::ok,
        signature::{self, SIGNATURE_HEADER},
    },
    error_handler::{AppError, AppResult},
    routes::webhook::pending_events_response::PendingEvent,
};

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

/// GitHub webhook receiver.
///
/// The body is taken raw so the signature is checked over the exact bytes
/// GitHub signed. The event is recorded and processed inline; a processing
/// failure answers 500 and leaves the event pending.
#[instrument(name = "github_webhook_route", skip(state, headers, body))]
pub async fn github_webhook_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    if let Some(secret) = state.config.github_webhook_secret.as_deref() {
        let provided = header_str(&headers, SIGNATURE_HEADER);
        signature::verify(secret, &body, provided).inspect_err(|e| {
            warn!(error = %e, "webhook signature rejected");
        })?;
    }

    let event = header_str(&headers, EVENT_HEADER)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing X-GitHub-Event header".into()))?;
    if let Some(delivery) = header_str(&headers, DELIVERY_HEADER) {
        debug!(%delivery, %event, "webhook delivery received");
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("payload is not valid JSON: {e}")))?;

    let receipt = state.events.handle(event, &payload).await?;
    Ok(ok(receipt))
}

/// Envelopes still waiting for successful processing, oldest first.
pub async fn pending_events_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let pending = state.events.store().pending_events().await?;
    Ok(ok(pending.into_iter().map(PendingEvent::from).collect::<Vec<_>>()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}
