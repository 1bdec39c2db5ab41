//! Server-Sent Events transport for clients without websockets.
//!
//! `GET /api/research?query=...` runs the same submit-and-relay path as the
//! websocket and streams `chunk` events (each the full report so far),
//! closing with one `done` or `error` event. Disconnecting cancels the run.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::info;

use crate::frame::ErrorCode;
use crate::research::{CancelToken, ResearchError};
use crate::services::research::{self, RelayOutcome, ReportSink};
use crate::state::AppState;

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Deserialize)]
pub struct ResearchParams {
    #[serde(default)]
    pub query: String,
}

pub async fn handle_sse(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<ResearchParams>,
) -> Response {
    let client = format!("ip:{}", addr.ip());
    let cancel = CancelToken::new();
    let (tx, events) = event_channel(&cancel);

    match research::submit(&state, &client, params.query, cancel.clone()) {
        Ok(stream) => {
            tokio::spawn(async move {
                let mut sink = EventSink { tx: tx.clone() };
                let last = match research::relay(stream, &cancel, &mut sink).await {
                    Ok(RelayOutcome::Completed { chunks }) => {
                        info!(%client, chunks, "sse: research run done");
                        Event::default().event("done").data(chunks.to_string())
                    }
                    Ok(RelayOutcome::Cancelled { chunks }) => {
                        info!(%client, chunks, "sse: research run cancelled");
                        return;
                    }
                    Err(e) => error_event(&e),
                };
                let _ = tx.send(last).await;
            });
        }
        Err(e) => {
            // Sent before the stream is handed to axum; the buffer has room.
            let _ = tx.try_send(error_event(&e));
        }
    }

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

fn error_event(err: &ResearchError) -> Event {
    let payload = json!({
        "code": err.error_code(),
        "message": err.to_string(),
        "retryable": err.retryable(),
    });
    Event::default().event("error").data(payload.to_string())
}

/// Event stream that cancels `cancel` when axum drops it (client gone).
fn event_channel(cancel: &CancelToken) -> (mpsc::Sender<Event>, BoxStream<'static, Result<Event, Infallible>>) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let guard = cancel.drop_guard();
    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|event| (Ok(event), (rx, guard)))
    })
    .boxed();
    (tx, stream)
}

struct EventSink {
    tx: mpsc::Sender<Event>,
}

#[async_trait::async_trait]
impl ReportSink for EventSink {
    async fn show(&mut self, chunk: String) -> bool {
        self.tx
            .send(Event::default().event("chunk").data(normalize_newlines(&chunk)))
            .await
            .is_ok()
    }
}

/// SSE treats a bare `\r` as a line break, so fold every line ending to `\n`
/// and let axum split the data into one `data:` line per line.
fn normalize_newlines(chunk: &str) -> String {
    chunk.replace("\r\n", "\n").replace('\r', "\n")
}
