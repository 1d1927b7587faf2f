//! Crate-wide error hierarchy for github-gateway.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Root error type for GitHub REST calls.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Unauthorized (HTTP 401).
    #[error("github: unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("github: forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("github: not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("github: rate limited")]
    RateLimited {
        /// `Retry-After` hint in seconds when available.
        retry_after_secs: Option<u64>,
    },

    /// Gateway / server error (HTTP 5xx).
    #[error("github: server error: status {0}")]
    Server(u16),

    /// Other non-2xx status not covered above.
    #[error("github: http status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("github: timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("github: network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("github: invalid response: {0}")]
    InvalidResponse(String),

    /// Caller input was rejected before any request was made.
    #[error("github: validation error: {0}")]
    Validation(String),
}

impl GitHubError {
    /// Maps a non-success status into the matching variant.
    pub fn from_status(status: StatusCode, retry_after_secs: Option<u64>) -> Self {
        let code = status.as_u16();
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited { retry_after_secs },
            500..=599 => Self::Server(code),
            _ => Self::HttpStatus(code),
        }
    }

    /// HTTP status this error corresponds to, if it came from GitHub.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Server(c) | Self::HttpStatus(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        if e.is_decode() {
            return Self::InvalidResponse(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::from_status(status, None);
        }
        Self::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_round_trips_code() {
        for code in [401u16, 403, 404, 429, 502, 418] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = GitHubError::from_status(status, Some(3));
            assert_eq!(err.status_code(), Some(code));
        }
        assert!(matches!(
            GitHubError::from_status(StatusCode::TOO_MANY_REQUESTS, Some(7)),
            GitHubError::RateLimited {
                retry_after_secs: Some(7)
            }
        ));
        assert_eq!(GitHubError::Timeout.status_code(), None);
    }
}
