//! WebSocket handler — research runs over JSON frames.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Frames produced by this connection's runs → forward to client
//!
//! Each `research:run` request gets its own relay task that pushes `item`
//! frames (markdown `content` + rendered `html`) into the connection channel
//! and finishes with `done`, `error` or `cancel`. The page has one report
//! display, so a new run cancels whatever was still running.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. `research:run` → submit → relay task streams frames back
//! 3. `cancel` (parent_id = run id) → run stops, answers with `cancel`
//! 4. Close → cancel every run of this connection

use std::collections::HashMap;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, FRAME_HTML, Frame, Status};
use crate::markdown::render_html;
use crate::research::{CancelToken, ReportStream};
use crate::services::research::{self, RelayOutcome, ReportSink};
use crate::state::AppState;

/// Frames buffered per connection between run tasks and the socket.
const CLIENT_BUFFER: usize = 256;

/// Running requests of one connection, keyed by request frame id.
type Runs = HashMap<Uuid, CancelToken>;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for frames produced by relay tasks.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_BUFFER);

    let welcome = Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    let mut runs = Runs::new();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, &mut runs, client_id, &client_tx, &text) {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if frame.status.is_terminal() {
                    if let Some(parent_id) = frame.parent_id {
                        runs.remove(&parent_id);
                    }
                }
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    for cancel in runs.values() {
        cancel.cancel();
    }
    info!(%client_id, abandoned_runs = runs.len(), "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Streaming output of a started run arrives later through `client_tx`.
fn process_inbound_text(
    state: &AppState,
    runs: &mut Runs,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    info!(%client_id, id = %req.id, syscall = %req.syscall, status = ?req.status, "ws: recv frame");

    if req.status == Status::Cancel {
        return handle_cancel(runs, client_id, &req);
    }

    let prefix = req.prefix();
    let result = match prefix {
        "research" => handle_research(state, runs, client_id, client_tx, &req),
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(()) => vec![],
        Err(err_frame) => vec![err_frame],
    }
}

fn handle_cancel(runs: &Runs, client_id: Uuid, req: &Frame) -> Vec<Frame> {
    let Some(target) = req.parent_id else {
        return vec![req.error("cancel requires parent_id")];
    };
    let Some(cancel) = runs.get(&target) else {
        return vec![req.error(format!("no running request: {target}"))];
    };
    info!(%client_id, %target, "ws: cancel requested");
    // The run's relay task answers with the `cancel` reply.
    cancel.cancel();
    vec![]
}

// =============================================================================
// RESEARCH HANDLERS
// =============================================================================

fn handle_research(
    state: &AppState,
    runs: &mut Runs,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<(), Frame> {
    match req.op() {
        "run" => {
            // Missing query is the same as an empty one: no validation here.
            let query = req.str_field("query").unwrap_or_default().to_string();
            let trigger = req.str_field("trigger").unwrap_or("-");

            let cancel = CancelToken::new();
            let stream = research::submit(state, &format!("ws:{client_id}"), query, cancel.clone())
                .map_err(|e| req.error_from(&e))?;

            // A rejected run leaves the current report streaming.
            for (previous, previous_cancel) in runs.drain() {
                info!(%client_id, %previous, "ws: superseding previous run");
                previous_cancel.cancel();
            }

            info!(%client_id, id = %req.id, trigger, "ws: research run started");
            runs.insert(req.id, cancel.clone());
            tokio::spawn(relay_run(req.clone(), stream, cancel, client_tx.clone()));
            Ok(())
        }
        op => Err(req.error(format!("unknown research op: {op}"))),
    }
}

/// Relay one run into the connection channel and close it with a terminal frame.
async fn relay_run(req: Frame, stream: ReportStream, cancel: CancelToken, client_tx: mpsc::Sender<Frame>) {
    let mut sink = FrameSink { req: req.clone(), tx: client_tx.clone() };
    let terminal = match research::relay(stream, &cancel, &mut sink).await {
        Ok(RelayOutcome::Completed { chunks }) => {
            info!(id = %req.id, chunks, "ws: research run done");
            req.done().with_data("chunks", chunks)
        }
        Ok(RelayOutcome::Cancelled { chunks }) => {
            info!(id = %req.id, chunks, "ws: research run cancelled");
            req.cancelled()
        }
        Err(e) => req.error_from(&e),
    };
    let _ = client_tx.send(terminal).await;
}

/// Turns chunks into `item` frames replying to the run request.
struct FrameSink {
    req: Frame,
    tx: mpsc::Sender<Frame>,
}

#[async_trait::async_trait]
impl ReportSink for FrameSink {
    async fn show(&mut self, chunk: String) -> bool {
        let html = render_html(&chunk);
        let frame = self
            .req
            .item(Data::new())
            .with_content(chunk)
            .with_data(FRAME_HTML, html);
        self.tx.send(frame).await.is_ok()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.str_field("code").unwrap_or("-");
        let message = frame.str_field("message").unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else if frame.status != Status::Item {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
