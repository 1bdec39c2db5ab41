//! Research orchestration — query in, stream of report chunks out.
//!
//! DESIGN
//! ======
//! An orchestrator turns one query into a lazy, ordered, finite stream of
//! *chunks*. Each chunk is the whole report as it stands (markdown), never a
//! delta, so a consumer only ever needs the latest one. A successful run ends
//! with the final report as its last chunk; a failed run ends with one `Err`.
//!
//! Streams are channel-backed: the producer runs as its own task and pushes
//! chunks into a bounded channel. Dropping the stream cancels the run, and
//! the [`CancelToken`] handed to [`ResearchOrchestrator::run`] lets the
//! caller cancel without dropping.

pub mod cancel;
pub mod manager;
pub mod progress;
#[cfg(test)]
pub mod scripted;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

pub use cancel::CancelToken;
pub use manager::ResearchManager;

use crate::llm::types::LlmError;

/// Buffered chunks per run. Chunks supersede each other, so a small buffer
/// is enough to keep the producer from stalling on a slow socket.
const CHUNK_BUFFER: usize = 16;

/// One run's output: full-report-so-far strings, consumed exactly once.
pub type ReportStream = BoxStream<'static, Result<String, ResearchError>>;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("research is not configured (set an LLM API key)")]
    NotConfigured,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("the writer returned an empty report")]
    EmptyReport,
    #[error("research run cancelled")]
    Cancelled,
}

impl crate::frame::ErrorCode for ResearchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "E_RESEARCH_NOT_CONFIGURED",
            Self::RateLimited(_) => "E_RATE_LIMITED",
            Self::Llm(_) => "E_LLM_ERROR",
            Self::EmptyReport => "E_EMPTY_REPORT",
            Self::Cancelled => "E_CANCELLED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Llm(e) if e.retryable()) || matches!(self, Self::RateLimited(_) | Self::EmptyReport)
    }
}

impl From<crate::rate_limit::RateLimitError> for ResearchError {
    fn from(e: crate::rate_limit::RateLimitError) -> Self {
        Self::RateLimited(e.to_string())
    }
}

// =============================================================================
// ORCHESTRATOR CONTRACT
// =============================================================================

/// Anything that can research a query and report progress as chunks.
///
/// Contract:
/// - a successful stream yields at least one chunk; the last one is the
///   final report
/// - the query is used as given, with no trimming or validation
/// - once `cancel` fires or the stream is dropped the producer stops
pub trait ResearchOrchestrator: Send + Sync {
    fn run(&self, query: String, cancel: CancelToken) -> ReportStream;
}

// =============================================================================
// CHUNK CHANNEL
// =============================================================================

/// Producer half of a report stream.
#[derive(Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Result<String, ResearchError>>,
}

impl ChunkSender {
    /// Push the next full-report chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Cancelled`] once the consumer has gone away.
    pub async fn send(&self, chunk: String) -> Result<(), ResearchError> {
        self.tx.send(Ok(chunk)).await.map_err(|_| ResearchError::Cancelled)
    }

    /// Terminate the stream with an error. Ignored if nobody is listening.
    pub async fn fail(&self, err: ResearchError) {
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Create a chunk channel whose stream cancels `cancel` when dropped.
#[must_use]
pub fn chunk_channel(cancel: &CancelToken) -> (ChunkSender, ReportStream) {
    let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
    let guard = cancel.drop_guard();
    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|item| (item, (rx, guard)))
    })
    .boxed();
    (ChunkSender { tx }, stream)
}
