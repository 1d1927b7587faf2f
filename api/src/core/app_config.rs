//! Process configuration, read once from the environment at startup.
//!
//! | Variable | Default |
//! |---|---|
//! | `API_ADDRESS` | `0.0.0.0:8000` |
//! | `DATABASE_PATH` | `data/retro.db` |
//! | `GITHUB_API_BASE` | `https://api.github.com` |
//! | `GITHUB_FALLBACK_TOKEN` | unset |
//! | `GITHUB_WEBHOOK_SECRET` | unset (signatures not checked) |
//! | `GITHUB_TIMEOUT_SECS` | `30` |
//! | `REVIEW_CALL_TIMEOUT_SECS` | `120` |
//!
//! LLM variables are documented in `ai_llm_service::config::default_config`.

use std::path::PathBuf;
use std::time::Duration;

use ai_llm_service::{AiLlmError, LlmModelConfig, config::default_config::config_from_env};
use thiserror::Error;

const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_DATABASE_PATH: &str = "data/retro.db";
const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REVIEW_CALL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer number of seconds, got '{value}'")]
    InvalidSeconds { var: &'static str, value: String },

    #[error("invalid LLM configuration: {0}")]
    Llm(#[from] AiLlmError),
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_address: String,
    pub database_path: PathBuf,
    pub github_api_base: String,
    /// Used when a PR author has no employee token.
    pub github_fallback_token: Option<String>,
    /// When set, `X-Hub-Signature-256` must match.
    pub github_webhook_secret: Option<String>,
    pub github_timeout: Duration,
    pub review_call_timeout: Duration,
    pub llm: LlmModelConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_address", &self.api_address)
            .field("database_path", &self.database_path)
            .field("github_api_base", &self.github_api_base)
            .field("github_fallback_token", &self.github_fallback_token.is_some())
            .field("github_webhook_secret", &self.github_webhook_secret.is_some())
            .field("github_timeout", &self.github_timeout)
            .field("review_call_timeout", &self.review_call_timeout)
            .field("llm_provider", &self.llm.provider)
            .field("llm_model", &self.llm.model)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm = config_from_env()?;
        Self::from_lookup(|var| std::env::var(var).ok(), llm)
    }

    /// Builds the config from `get`; blank values count as unset.
    pub fn from_lookup<F>(get: F, llm: LlmModelConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let seconds = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match var(name) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => match raw.parse::<u64>() {
                    Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
                    _ => Err(ConfigError::InvalidSeconds { var: name, value: raw }),
                },
            }
        };

        Ok(Self {
            api_address: var("API_ADDRESS").unwrap_or_else(|| DEFAULT_API_ADDRESS.into()),
            database_path: var("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.into())
                .into(),
            github_api_base: var("GITHUB_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_BASE.into()),
            github_fallback_token: var("GITHUB_FALLBACK_TOKEN"),
            github_webhook_secret: var("GITHUB_WEBHOOK_SECRET"),
            github_timeout: seconds("GITHUB_TIMEOUT_SECS", DEFAULT_GITHUB_TIMEOUT_SECS)?,
            review_call_timeout: seconds(
                "REVIEW_CALL_TIMEOUT_SECS",
                DEFAULT_REVIEW_CALL_TIMEOUT_SECS,
            )?,
            llm,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_llm_config(endpoint: &str) -> LlmModelConfig {
    use ai_llm_service::LlmProvider;

    LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: "gpt-4o-mini".into(),
        endpoint: endpoint.into(),
        api_key: Some("sk-test".into()),
        max_tokens: None,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(5),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[]), test_llm_config("http://llm")).unwrap();
        assert_eq!(cfg.api_address, "0.0.0.0:8000");
        assert_eq!(cfg.database_path, PathBuf::from("data/retro.db"));
        assert_eq!(cfg.github_api_base, "https://api.github.com");
        assert_eq!(cfg.github_timeout, Duration::from_secs(30));
        assert_eq!(cfg.review_call_timeout, Duration::from_secs(120));
        assert!(cfg.github_fallback_token.is_none());
        assert!(cfg.github_webhook_secret.is_none());
    }

    #[test]
    fn blank_secrets_count_as_unset() {
        let cfg = AppConfig::from_lookup(
            lookup(&[("GITHUB_WEBHOOK_SECRET", "  "), ("GITHUB_FALLBACK_TOKEN", "ghp_x")]),
            test_llm_config("http://llm"),
        )
        .unwrap();
        assert!(cfg.github_webhook_secret.is_none());
        assert_eq!(cfg.github_fallback_token.as_deref(), Some("ghp_x"));
        assert!(!format!("{cfg:?}").contains("ghp_x"));
    }

    #[test]
    fn bad_timeouts_are_rejected() {
        for bad in ["0", "soon", "-3"] {
            let err = AppConfig::from_lookup(
                lookup(&[("GITHUB_TIMEOUT_SECS", bad)]),
                test_llm_config("http://llm"),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSeconds { var: "GITHUB_TIMEOUT_SECS", .. }));
        }
    }
}
