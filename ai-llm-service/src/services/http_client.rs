//! Plumbing shared by the provider clients.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

/// Used when the config leaves `timeout_secs` unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Validates `endpoint` and returns it without a trailing slash.
pub fn base_url(provider: Provider, endpoint: &str) -> Result<String, AiLlmError> {
    let trimmed = endpoint.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
        )
        .into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub fn request_timeout(timeout_secs: Option<u64>) -> Duration {
    timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
}

/// POSTs `body` as JSON and decodes a JSON reply.
///
/// Non-2xx replies become `HttpStatus` with a trimmed body snippet, bodies
/// that do not match `R` become `Decode`.
pub async fn post_json<B, R>(
    client: &Client,
    provider: Provider,
    url: &str,
    body: &B,
) -> Result<R, AiLlmError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let started = Instant::now();
    debug!(?provider, %url, "sending completion request");

    let resp = client.post(url).json(body).send().await?;
    let status = resp.status();

    if !status.is_success() {
        let snippet = make_snippet(&resp.text().await.unwrap_or_default());
        error!(
            ?provider,
            %status,
            %url,
            %snippet,
            latency_ms = started.elapsed().as_millis(),
            "completion endpoint rejected the request"
        );
        let http = HttpError {
            status,
            url: url.to_string(),
            snippet,
        };
        return Err(ProviderError::new(provider, ProviderErrorKind::HttpStatus(http)).into());
    }

    let decoded = resp.json::<R>().await.map_err(|e| {
        error!(?provider, %url, error = %e, "undecodable completion reply");
        ProviderError::new(provider, ProviderErrorKind::Decode(e.to_string()))
    })?;

    debug!(
        ?provider,
        latency_ms = started.elapsed().as_millis(),
        "completion reply decoded"
    );
    Ok(decoded)
}
