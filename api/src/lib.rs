//! HTTP surface of the PR retro backend.
//!
//! - `POST /webhooks/github` records and processes GitHub events.
//! - `GET /users/{user_id}/...` read views over GitHub data merged with the
//!   stored review feedback, authenticated with the employee's own token.

pub mod core {
    pub mod app_config;
    pub mod app_state;
    pub mod credentials;
    pub mod dates;
    pub mod file_tree;
    pub mod signature;
    pub mod http {
        pub mod response_envelope;
    }
}

pub mod error_handler;

mod middleware_layer {
    pub mod rejection_envelope;
}

mod routes {
    pub mod health {
        pub mod health_route;
    }
    pub mod webhook {
        pub mod github_webhook_route;
        pub mod pending_events_response;
    }
    pub mod repos {
        pub mod repos_response;
        pub mod repos_route;
    }
    pub mod commits {
        pub mod commits_response;
        pub mod commits_route;
    }
    pub mod pulls {
        pub mod pulls_response;
        pub mod pulls_route;
    }
    pub mod dashboard {
        pub mod dashboard_route;
    }
}


use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::{
    core::{app_config::AppConfig, app_state::AppState},
    error_handler::AppError,
    middleware_layer::rejection_envelope::rejection_envelope,
    routes::{
        commits::commits_route::{commit_feedback_route, grouped_commits_route},
        dashboard::dashboard_route::dashboard_route,
        health::health_route::health_route,
        pulls::pulls_route::{pull_feedback_route, user_pulls_route},
        repos::repos_route::{repo_branches_route, user_repos_route},
        webhook::github_webhook_route::{github_webhook_route, pending_events_route},
    },
};

/// All routes over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_route))
        .route("/webhooks/github", post(github_webhook_route))
        .route("/webhooks/github/pending", get(pending_events_route))
        .route("/users/{user_id}/repos", get(user_repos_route))
        .route("/users/{user_id}/repos/{owner}/{repo}/branches", get(repo_branches_route))
        .route("/users/{user_id}/repos/{owner}/{repo}/commits", get(grouped_commits_route))
        .route("/users/{user_id}/repos/{owner}/{repo}/commits/{sha}", get(commit_feedback_route))
        .route("/users/{user_id}/repos/{owner}/{repo}/pulls", get(user_pulls_route))
        .route("/users/{user_id}/repos/{owner}/{repo}/pulls/{number}", get(pull_feedback_route))
        .route("/users/{user_id}/dashboard", get(dashboard_route))
        .layer(middleware::from_fn(rejection_envelope))
        .with_state(state)
}

/// Reads the config from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    info!(?config, "configuration loaded");

    let addr = config.api_address.clone();
    let state = Arc::new(AppState::build(config)?);

    let listener = TcpListener::bind(&addr).await.map_err(AppError::Bind)?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

/// Resolves on Ctrl+C. If the handler cannot be installed the server keeps
/// running until killed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
