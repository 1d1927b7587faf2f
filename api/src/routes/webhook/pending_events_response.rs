use chrono::{DateTime, Utc};
use feedback_store::GithubEventEnvelope;
use serde::Serialize;

/// Backlog entry; the payload itself is not echoed back.
#[derive(Debug, Serialize)]
pub struct PendingEvent {
    pub id: i64,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<GithubEventEnvelope> for PendingEvent {
    fn from(e: GithubEventEnvelope) -> Self {
        Self {
            id: e.id,
            event_type: e.event_type,
            created_at: e.created_at,
        }
    }
}
