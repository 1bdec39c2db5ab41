//! Scripted orchestrator for shell and transport tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CancelToken, ReportStream, ResearchError, ResearchOrchestrator, chunk_channel};

/// Replays fixed chunks (optionally prefixed with the query), then ends,
/// fails, or stays open until cancelled.
#[derive(Default)]
pub struct ScriptedOrchestrator {
    chunks: Vec<String>,
    echo_query: bool,
    error: Option<fn() -> ResearchError>,
    delay: Duration,
    hold_open: bool,
    queries: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<Vec<CancelToken>>>,
}

impl ScriptedOrchestrator {
    pub fn new<S: Into<String>>(chunks: impl IntoIterator<Item = S>) -> Self {
        Self { chunks: chunks.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Prefix every chunk with `"{query}: "`.
    pub fn echoing(mut self) -> Self {
        self.echo_query = true;
        self
    }

    /// End with this error after the chunks.
    pub fn failing(mut self, error: fn() -> ResearchError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sleep before each chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// After the chunks, wait for cancellation instead of ending.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Every query this orchestrator was asked to run, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// The cancel token handed to each run, in call order.
    pub fn cancel_tokens(&self) -> Vec<CancelToken> {
        self.tokens.lock().unwrap().clone()
    }
}

impl ResearchOrchestrator for ScriptedOrchestrator {
    fn run(&self, query: String, cancel: CancelToken) -> ReportStream {
        self.queries.lock().unwrap().push(query.clone());
        self.tokens.lock().unwrap().push(cancel.clone());
        let (tx, stream) = chunk_channel(&cancel);
        let chunks = self.chunks.clone();
        let (echo, error, delay, hold_open) = (self.echo_query, self.error, self.delay, self.hold_open);

        tokio::spawn(async move {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                let chunk = if echo { format!("{query}: {chunk}") } else { chunk };
                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
            if let Some(error) = error {
                tx.fail(error()).await;
            } else if hold_open {
                cancel.cancelled().await;
            }
        });

        stream
    }
}
