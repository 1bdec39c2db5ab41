mod config;
mod frame;
mod llm;
mod markdown;
mod rate_limit;
mod research;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use research::{ResearchManager, ResearchOrchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `.env` wins over the inherited environment.
    let _ = dotenvy::dotenv_override();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env()?;

    // Initialize research (non-fatal: requests get E_RESEARCH_NOT_CONFIGURED).
    let orchestrator: Option<Arc<dyn ResearchOrchestrator>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(ResearchManager::new(Arc::new(client), config.research)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; research disabled");
            None
        }
    };

    let rate_limits = rate_limit::RateLimitConfig::from_env();
    let state = state::AppState::new(orchestrator, rate_limit::RateLimiter::new(rate_limits));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    let url = config.browser_url();
    tracing::info!(addr = %listener.local_addr()?, %url, "deep research listening");

    if config.open_browser {
        if let Err(e) = open::that_detached(&url) {
            tracing::warn!(error = %e, %url, "could not open browser");
        }
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
