use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use feedback_store::StoreError;
use github_gateway::GitHubError;
use pr_reviewer::EventError;
use thiserror::Error;
use tracing::error;

use crate::core::{
    app_config::ConfigError, http::response_envelope::ApiResponse, signature::SignatureError,
};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open feedback store: {0}")]
    StoreOpen(#[source] StoreError),

    #[error("failed to build GitHub client: {0}")]
    GitHubClient(#[source] GitHubError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("{0}")]
    NotFound(&'static str),

    // --- Lower layers ---
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Signature(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::GitHub(e) => match e {
                GitHubError::Unauthorized => StatusCode::UNAUTHORIZED,
                GitHubError::Forbidden => StatusCode::FORBIDDEN,
                GitHubError::NotFound => StatusCode::NOT_FOUND,
                GitHubError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                GitHubError::Validation(_) => StatusCode::BAD_REQUEST,
                GitHubError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },

            AppError::Config(_)
            | AppError::StoreOpen(_)
            | AppError::GitHubClient(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::StoreOpen(_) => "STORE_OPEN_ERROR",
            AppError::GitHubClient(_) => "GITHUB_CLIENT_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Signature(_) => "INVALID_SIGNATURE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Event(_) => "EVENT_PROCESSING_FAILED",
            AppError::GitHub(e) => match e {
                GitHubError::Unauthorized => "GITHUB_UNAUTHORIZED",
                GitHubError::Forbidden => "GITHUB_FORBIDDEN",
                GitHubError::NotFound => "GITHUB_NOT_FOUND",
                GitHubError::RateLimited { .. } => "GITHUB_RATE_LIMITED",
                GitHubError::Validation(_) => "INVALID_REPOSITORY",
                GitHubError::Timeout => "GITHUB_TIMEOUT",
                _ => "GITHUB_ERROR",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "request failed");
        }

        let hint = match &self {
            AppError::GitHub(GitHubError::RateLimited {
                retry_after_secs: Some(s),
            }) => Some(format!("Retry after {s} seconds.")),
            AppError::Event(e) => e
                .envelope_id()
                .map(|id| format!("Event {id} is kept as pending.")),
            _ => None,
        };

        ApiResponse::<()>::error(self.error_code(), self.to_string(), hint)
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_errors_keep_their_meaning() {
        let cases = [
            (GitHubError::NotFound, StatusCode::NOT_FOUND, "GITHUB_NOT_FOUND"),
            (GitHubError::Unauthorized, StatusCode::UNAUTHORIZED, "GITHUB_UNAUTHORIZED"),
            (GitHubError::Server(503), StatusCode::BAD_GATEWAY, "GITHUB_ERROR"),
            (GitHubError::Timeout, StatusCode::GATEWAY_TIMEOUT, "GITHUB_TIMEOUT"),
        ];
        for (err, status, code) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status_code(), status);
            assert_eq!(app.error_code(), code);
        }
    }

    #[test]
    fn not_found_is_404() {
        let resp = AppError::NotFound("GitHub token is empty").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
