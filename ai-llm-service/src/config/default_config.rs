//! Default LLM config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`openai` (default) or `ollama`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 120)
//!
//! OpenAI-specific:
//! - `OPENAI_URL`     = base URL (default `https://api.openai.com`)
//! - `OPENAI_MODEL`   = model (default `gpt-4o-mini`)
//! - `OPENAI_API_KEY` = default key (optional here; callers may pass one per request)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds the review model config for the provider selected by `LLM_KIND`.
///
/// # Errors
/// Any [`ConfigError`] raised by the provider-specific constructor, or
/// [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`.
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match opt_env("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };

    match provider {
        LlmProvider::OpenAI => config_openai(),
        LlmProvider::Ollama => config_ollama(),
    }
}

/// Constructs a config for an OpenAI-compatible chat-completions endpoint.
///
/// # Defaults
/// - `temperature = Some(0.2)` (reviews should be stable between runs)
/// - `timeout_secs = Some(120)`
pub fn config_openai() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = opt_env("OPENAI_URL").unwrap_or_else(|| "https://api.openai.com".into());
    validate_http_endpoint("OPENAI_URL", &endpoint)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
        endpoint,
        api_key: opt_env("OPENAI_API_KEY"),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs a config for a local Ollama model.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS` (optional)
pub fn config_ollama() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}
