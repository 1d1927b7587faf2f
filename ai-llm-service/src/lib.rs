//! Shared LLM completion service.
//!
//! - One [`llm_service::LlmService`] per process, wrapped in `Arc` and shared.
//! - Concrete HTTP clients (OpenAI-compatible and Ollama) are cached per
//!   `(provider, endpoint, model, api key, timeout)` so callers may pass a
//!   different API key per call without rebuilding clients every time.
//! - Configuration is read once from the environment by [`config::default_config`].

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod http_client;
    pub mod ollama_service;
    pub mod open_ai_service;
}

pub mod error_handler;
pub mod llm_service;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use llm_service::LlmService;
