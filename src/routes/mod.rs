//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the UI page, the websocket and SSE research transports, and a
//! liveness check under a single Axum router. SSE needs the peer address, so
//! `main` serves this router with connect info.

pub mod sse;
pub mod ui;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/research", get(sse::handle_sse))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
