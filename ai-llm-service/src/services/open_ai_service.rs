//! Client for OpenAI-compatible `POST {endpoint}/v1/chat/completions`.
//!
//! Requires `LlmProvider::OpenAI` and an API key. The key travels as a
//! default `Authorization` header, so one client is bound to one key.

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::http_client::{base_url, post_json, request_timeout},
};

#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    completions_url: String,
}

impl OpenAiService {
    /// # Errors
    /// `InvalidProvider`, `MissingApiKey`, `InvalidEndpoint`, or a transport
    /// error when the HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let provider_error = |kind| AiLlmError::from(ProviderError::new(Provider::OpenAI, kind));

        if cfg.provider != LlmProvider::OpenAI {
            return Err(provider_error(ProviderErrorKind::InvalidProvider));
        }
        let Some(api_key) = cfg.api_key.as_deref() else {
            return Err(provider_error(ProviderErrorKind::MissingApiKey));
        };
        let base = base_url(Provider::OpenAI, &cfg.endpoint)?;

        let auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            provider_error(ProviderErrorKind::Decode(format!("unusable API key: {e}")))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(request_timeout(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        info!(model = %cfg.model, endpoint = %base, "OpenAI-compatible client ready");

        Ok(Self {
            client,
            completions_url: format!("{base}/v1/chat/completions"),
            cfg,
        })
    }

    /// One non-streaming completion: optional `system` message, then `prompt`.
    ///
    /// Returns the content of the first choice that has any. A reply cut off
    /// by `max_tokens` is still returned, with a warning, since the caller's
    /// parser decides whether it is usable.
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let request = ChatRequest::new(&self.cfg, prompt, system);
        let reply: ChatReply =
            post_json(&self.client, Provider::OpenAI, &self.completions_url, &request).await?;

        let choice = reply
            .choices
            .into_iter()
            .find(|c| c.message.content.is_some())
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!(max_tokens = ?self.cfg.max_tokens, "completion truncated by token limit");
        }

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatRequest<'a> {
    fn new(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let messages = system
            .map(|content| Message { role: "system", content })
            .into_iter()
            .chain([Message { role: "user", content: prompt }])
            .collect();

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(endpoint: &str, key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-test".into(),
            endpoint: endpoint.into(),
            api_key: key.map(str::to_string),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn requires_api_key() {
        let err = OpenAiService::new(cfg("http://localhost:1", None)).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            })
        ));
    }

    #[test]
    fn rejects_ollama_config() {
        let mut c = cfg("http://localhost:1", Some("k"));
        c.provider = LlmProvider::Ollama;
        let err = OpenAiService::new(c).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidProvider,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn sends_review_prompt_as_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [{ "role": "user", "content": "review this diff" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "[]" }, "finish_reason": "stop" }]
            })))
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri(), Some("sk-test"))).unwrap();
        assert_eq!(svc.generate("review this diff", None).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn truncated_reply_is_still_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "[{\"line\": 3" }, "finish_reason": "length" }]
            })))
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri(), Some("k"))).unwrap();
        assert_eq!(svc.generate("p", None).await.unwrap(), "[{\"line\": 3");
    }

    #[tokio::test]
    async fn maps_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri(), Some("sk-wrong"))).unwrap();
        match svc.generate("hi", None).await.unwrap_err() {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(h),
                ..
            }) => {
                assert_eq!(h.status.as_u16(), 401);
                assert_eq!(h.snippet, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri(), Some("k"))).unwrap();
        let err = svc.generate("hi", Some("system")).await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyChoices,
                ..
            })
        ));
    }
}
