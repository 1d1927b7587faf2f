use std::error::Error;

use ai_llm_service::telemetry;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events reach the console.
const LOG_TARGETS: &[&str] = &[
    "pr_retro_backend",
    "api",
    "pr_reviewer",
    "feedback_store",
    "github_gateway",
    telemetry::TARGET_PREFIX,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // `.env` is optional; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(telemetry::layer(LOG_TARGETS))
        .try_init()?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => info!("no .env file, using process environment"),
        Err(e) => warn!(error = %e, "ignoring unreadable .env file"),
    }

    api::start().await?;
    Ok(())
}
