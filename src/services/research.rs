//! Research service — the one handler behind every UI trigger.
//!
//! DESIGN
//! ======
//! [`submit`] turns a query into a report stream (after the configured and
//! rate-limit checks); [`relay`] pumps that stream into a [`ReportSink`],
//! which is whatever "the display" is for the transport: websocket item
//! frames, SSE events, or a test recorder. Button click and Enter key send
//! the same request, so they reach the same two calls.
//!
//! The query is never trimmed or validated here.

use futures::StreamExt;
use tracing::{info, warn};

use crate::research::{CancelToken, ReportStream, ResearchError};
use crate::state::AppState;

/// Destination for report chunks. Each chunk replaces the previous one.
#[async_trait::async_trait]
pub trait ReportSink: Send {
    /// Display `chunk`. Returns `false` once the display has gone away.
    async fn show(&mut self, chunk: String) -> bool;
}

/// How a relay ended when the stream did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The stream ran to completion; `chunks` were shown.
    Completed { chunks: usize },
    /// The run was cancelled or the sink went away after `chunks`.
    Cancelled { chunks: usize },
}

/// Start a research run for `client`.
///
/// # Errors
///
/// [`ResearchError::NotConfigured`] without an orchestrator,
/// [`ResearchError::RateLimited`] when `client` or the server is over its
/// limit.
pub fn submit(
    state: &AppState,
    client: &str,
    query: String,
    cancel: CancelToken,
) -> Result<ReportStream, ResearchError> {
    let Some(orchestrator) = state.orchestrator.as_ref() else {
        return Err(ResearchError::NotConfigured);
    };
    state.rate_limiter.check_and_record(client)?;
    info!(client, query_len = query.len(), "research: submitted");
    Ok(orchestrator.run(query, cancel))
}

/// Forward every chunk of `stream` to `sink`, in order, until it ends.
///
/// # Errors
///
/// Returns the stream's error item. Chunks shown before it stay displayed.
pub async fn relay(
    mut stream: ReportStream,
    cancel: &CancelToken,
    sink: &mut dyn ReportSink,
) -> Result<RelayOutcome, ResearchError> {
    let mut chunks = 0;
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(chunks, "research: relay cancelled");
                return Ok(RelayOutcome::Cancelled { chunks });
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                if !sink.show(chunk).await {
                    cancel.cancel();
                    return Ok(RelayOutcome::Cancelled { chunks });
                }
                chunks += 1;
            }
            Some(Err(e)) => {
                warn!(chunks, error = %e, "research: run failed");
                return Err(e);
            }
            None => return Ok(RelayOutcome::Completed { chunks }),
        }
    }
}

#[cfg(test)]
#[path = "research_test.rs"]
mod tests;
