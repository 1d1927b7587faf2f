//! Client for a local Ollama server, `POST {endpoint}/api/generate`.
//!
//! Ollama has no API keys; a key in the config is ignored.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::http_client::{base_url, post_json, request_timeout},
};

#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    generate_url: String,
}

impl OllamaService {
    /// # Errors
    /// `InvalidProvider`, `InvalidEndpoint`, or a transport error when the
    /// HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let base = base_url(Provider::Ollama, &cfg.endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout(cfg.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            generate_url: format!("{base}/api/generate"),
            cfg,
        })
    }

    /// One non-streaming generation. `max_tokens` maps to `num_predict`.
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let request = GenerateRequest {
            model: &self.cfg.model,
            prompt,
            stream: false,
            options: Options {
                temperature: self.cfg.temperature,
                top_p: self.cfg.top_p,
                num_predict: self.cfg.max_tokens,
            },
        };
        let reply: GenerateReply =
            post_json(&self.client, Provider::Ollama, &self.generate_url, &request).await?;

        if reply.done_reason.as_deref() == Some("length") {
            warn!(num_predict = ?self.cfg.max_tokens, "generation truncated by token limit");
        }
        if reply.response.trim().is_empty() {
            let empty = ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices);
            return Err(empty.into());
        }
        Ok(reply.response)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: Some(128),
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = OllamaService::new(cfg("localhost:11434")).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidEndpoint(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn sends_non_streaming_request_with_token_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "qwen3:14b",
                "stream": false,
                "options": { "num_predict": 128 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "[]", "done_reason": "stop" })),
            )
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        assert_eq!(svc.generate("hello").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn blank_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let err = svc.generate("hello").await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyChoices,
                ..
            })
        ));
    }
}
