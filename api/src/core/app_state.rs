use std::sync::Arc;

use ai_llm_service::LlmService;
use feedback_store::FeedbackStore;
use github_gateway::{GitHubClient, GitHubConfig};
use pr_reviewer::{EventDispatcher, ReviewConfig, ReviewPipeline};
use tracing::info;

use crate::{core::app_config::AppConfig, error_handler::AppError};

pub type Dispatcher = EventDispatcher<GitHubClient, LlmService>;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: FeedbackStore,
    /// Same client the review pipeline uses.
    pub github: Arc<GitHubClient>,
    pub events: Dispatcher,
}

impl AppState {
    /// Opens the on-disk store and wires the clients from `config`.
    pub fn build(config: AppConfig) -> Result<Self, AppError> {
        let store = FeedbackStore::open(&config.database_path).map_err(AppError::StoreOpen)?;
        info!(path = %config.database_path.display(), "feedback store opened");
        Self::with_store(config, store)
    }

    /// Wires the clients around an already opened store.
    pub fn with_store(config: AppConfig, store: FeedbackStore) -> Result<Self, AppError> {
        let github = Arc::new(
            GitHubClient::new(GitHubConfig {
                base_api: config.github_api_base.clone(),
                timeout: config.github_timeout,
            })
            .map_err(AppError::GitHubClient)?,
        );
        let llm = Arc::new(LlmService::new(config.llm.clone()));

        let review_cfg = ReviewConfig {
            fallback_github_token: config.github_fallback_token.clone(),
            llm_api_key: None,
            call_timeout: config.review_call_timeout,
        };
        let pipeline = ReviewPipeline::new(Arc::clone(&github), llm, store.clone(), review_cfg);

        Ok(Self {
            config,
            store,
            github,
            events: EventDispatcher::new(pipeline),
        })
    }
}
