//! Shared LLM completion service.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout),
//!   so a per-request API key does not rebuild a client on every call.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmModelConfig, LlmProvider, LlmService};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(512),
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(60),
//! };
//!
//! let svc = Arc::new(LlmService::new(cfg));
//! let txt = svc.generate("Hello world", None).await?;
//! println!("{txt}");
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Completion service bound to one model configuration.
pub struct LlmService {
    cfg: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmService {
    /// Creates a new service. Clients are built lazily on first use.
    pub fn new(cfg: LlmModelConfig) -> Self {
        Self {
            cfg,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the base configuration.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Generates a completion for `prompt`.
    ///
    /// `api_key` overrides the configured default key for this call only.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or generation fails.
    pub async fn generate(
        &self,
        prompt: &str,
        api_key: Option<&str>,
    ) -> Result<String, AiLlmError> {
        let cfg = self.cfg.with_api_key(api_key);
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&cfg).await?;
                cli.generate(prompt).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(&cfg).await?;
                cli.generate(prompt, None).await
            }
        }
    }

    /// Number of distinct cached clients (both providers).
    pub async fn cached_clients(&self) -> usize {
        self.ollama.read().await.len() + self.openai.read().await.len()
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, "initializing Ollama client");
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, "initializing OpenAI client");
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn openai_cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-test".into(),
            endpoint: endpoint.into(),
            api_key: Some("sk-default".into()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn per_call_key_overrides_default_and_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "user" } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "default" } }]
            })))
            .mount(&server)
            .await;

        let svc = LlmService::new(openai_cfg(&server.uri()));

        assert_eq!(svc.generate("p", Some("sk-user")).await.unwrap(), "user");
        assert_eq!(svc.generate("p", Some("sk-user")).await.unwrap(), "user");
        assert_eq!(svc.generate("p", None).await.unwrap(), "default");
        assert_eq!(svc.cached_clients().await, 2);
    }

    #[tokio::test]
    async fn blank_key_falls_back_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .mount(&server)
            .await;

        let svc = LlmService::new(openai_cfg(&server.uri()));
        assert_eq!(svc.generate("p", Some("   ")).await.unwrap(), "ok");
    }
}
