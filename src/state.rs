//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the research orchestrator (absent when no LLM is configured) and the
//! rate limiter, the only mutable state shared between requests. Display
//! state lives in the browser; runs keep nothing here.

use std::sync::Arc;

use crate::rate_limit::RateLimiter;
use crate::research::ResearchOrchestrator;

/// Clone is required by Axum; every field is Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    /// `None` if the LLM env vars are not configured.
    pub orchestrator: Option<Arc<dyn ResearchOrchestrator>>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: Option<Arc<dyn ResearchOrchestrator>>, rate_limiter: RateLimiter) -> Self {
        Self { orchestrator, rate_limiter }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
