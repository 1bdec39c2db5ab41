//! Research manager — plan, search, write on top of [`LlmChat`].
//!
//! DESIGN
//! ======
//! Three LLM stages, each emitting a full progress document:
//! 1. plan: the model calls `plan_searches` with a list of searches
//! 2. search: each search is summarized, `search_concurrency` at a time;
//!    failures are logged and skipped
//! 3. write: the model calls `submit_report` with the finished report
//!
//! The pipeline runs as its own task and feeds a chunk channel. Every LLM
//! call races the run's [`CancelToken`], and every send fails once the
//! consumer is gone, so a cancelled run stops at the next await.

use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::progress::{ProgressReport, ReportData, SearchItem};
use super::{CancelToken, ChunkSender, ReportStream, ResearchError, ResearchOrchestrator, chunk_channel};
use crate::config::ResearchConfig;
use crate::llm::LlmChat;
use crate::llm::tools::{PLAN_SEARCHES, SUBMIT_REPORT, plan_searches_tool, submit_report_tool};
use crate::llm::types::{ChatResponse, LlmError, Message};

const SEARCH_PROMPT: &str = "You are a research assistant. Given a search term, produce a concise \
summary of what a web search for that term would surface. The summary must be 2-3 paragraphs and \
less than 300 words. Capture the main points. Write succinctly; no need for complete sentences or \
good grammar. This will be consumed by someone synthesizing a report, so it is vital you capture \
the essence and ignore any fluff. Do not include any additional commentary other than the summary \
itself.";

const WRITER_PROMPT: &str = "You are a senior researcher tasked with writing a cohesive report for \
a research query. You will be provided with the original query and some initial research done by \
a research assistant. First come up with an outline for the report that describes its structure \
and flow. Then generate the report and return it as your final output. The final output should be \
in markdown format, and it should be lengthy and detailed. Aim for 5-10 pages of content, at least \
1000 words. Submit it by calling the submit_report tool.";

#[derive(Debug, Deserialize)]
struct SearchPlan {
    #[serde(default)]
    searches: Vec<SearchItem>,
}

/// LLM-backed [`ResearchOrchestrator`].
pub struct ResearchManager {
    llm: Arc<dyn LlmChat>,
    config: ResearchConfig,
}

impl ResearchManager {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, config: ResearchConfig) -> Self {
        Self { llm, config }
    }
}

impl ResearchOrchestrator for ResearchManager {
    fn run(&self, query: String, cancel: CancelToken) -> ReportStream {
        let (tx, stream) = chunk_channel(&cancel);
        let llm = self.llm.clone();
        let config = self.config;

        tokio::spawn(async move {
            let run_id = Uuid::new_v4();
            info!(%run_id, query_len = query.len(), "research: run started");
            match pipeline(llm.as_ref(), config, &query, &cancel, &tx).await {
                Ok(chunks) => info!(%run_id, chunks, "research: run complete"),
                Err(ResearchError::Cancelled) => info!(%run_id, "research: run cancelled"),
                Err(e) => {
                    warn!(%run_id, error = %e, "research: run failed");
                    tx.fail(e).await;
                }
            }
        });

        stream
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Run all stages. Returns the number of chunks sent.
async fn pipeline(
    llm: &dyn LlmChat,
    config: ResearchConfig,
    query: &str,
    cancel: &CancelToken,
    tx: &ChunkSender,
) -> Result<usize, ResearchError> {
    let mut sent = 0;
    let mut progress = ProgressReport::new(query);
    emit(tx, &mut sent, progress.render()).await?;

    let plan = plan_searches(llm, config, query, cancel).await?;
    progress.planned(&plan);
    emit(tx, &mut sent, progress.render()).await?;

    let summaries = perform_searches(llm, config, &plan, cancel, tx, &mut progress, &mut sent).await?;

    progress.writing();
    emit(tx, &mut sent, progress.render()).await?;

    let report = write_report(llm, config, query, &summaries, cancel).await?;
    let markdown = report.to_markdown();
    if markdown.trim().is_empty() {
        return Err(ResearchError::EmptyReport);
    }
    emit(tx, &mut sent, markdown).await?;
    Ok(sent)
}

async fn emit(tx: &ChunkSender, sent: &mut usize, chunk: String) -> Result<(), ResearchError> {
    tx.send(chunk).await?;
    *sent += 1;
    Ok(())
}

/// Await an LLM call unless the run is cancelled first.
async fn guarded<T>(
    cancel: &CancelToken,
    call: impl Future<Output = Result<T, LlmError>>,
) -> Result<T, ResearchError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ResearchError::Cancelled),
        res = call => res.map_err(ResearchError::from),
    }
}

fn log_usage(stage: &str, response: &ChatResponse) {
    info!(
        stage,
        stop_reason = %response.stop_reason,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "research: LLM response"
    );
}

// =============================================================================
// STAGES
// =============================================================================

fn planner_prompt(search_count: usize) -> String {
    format!(
        "You are a helpful research assistant. Given a query, come up with a set of web searches \
to perform to best answer the query. Output {search_count} terms to query for by calling the \
plan_searches tool."
    )
}

async fn plan_searches(
    llm: &dyn LlmChat,
    config: ResearchConfig,
    query: &str,
    cancel: &CancelToken,
) -> Result<Vec<SearchItem>, ResearchError> {
    let tools = [plan_searches_tool(config.search_count)];
    let messages = [Message::user(format!("Query: <user_input>{query}</user_input>"))];
    let system = planner_prompt(config.search_count);

    let response = guarded(cancel, llm.chat(config.max_tokens, &system, &messages, Some(&tools))).await?;
    log_usage("plan", &response);

    let plan: Vec<SearchItem> = response
        .tool_input(PLAN_SEARCHES)
        .and_then(|input| serde_json::from_value::<SearchPlan>(input.clone()).ok())
        .map(|p| p.searches)
        .unwrap_or_default()
        .into_iter()
        .filter(|item| !item.query.trim().is_empty())
        .take(config.search_count)
        .collect();

    if plan.is_empty() {
        warn!("research: planner returned no searches; searching the query directly");
        return Ok(vec![SearchItem { reason: "Planner returned no searches.".into(), query: query.to_string() }]);
    }
    info!(searches = plan.len(), "research: plan ready");
    Ok(plan)
}

async fn perform_searches(
    llm: &dyn LlmChat,
    config: ResearchConfig,
    plan: &[SearchItem],
    cancel: &CancelToken,
    tx: &ChunkSender,
    progress: &mut ProgressReport,
    sent: &mut usize,
) -> Result<Vec<String>, ResearchError> {
    // Indices keep the closure free of a higher-ranked `&SearchItem` borrow,
    // which the spawned pipeline future cannot satisfy.
    let mut results = futures::stream::iter(0..plan.len())
        .map(move |i| {
            let item = &plan[i];
            async move { (item, search(llm, config, item, cancel).await) }
        })
        .buffer_unordered(config.search_concurrency.max(1));

    let mut summaries = Vec::with_capacity(plan.len());
    while let Some((item, result)) = results.next().await {
        match result {
            Ok(Some(summary)) => {
                progress.search_finished(true);
                summaries.push(summary);
            }
            Ok(None) => {
                warn!(query = %item.query, "research: search returned nothing, skipping");
                progress.search_finished(false);
            }
            Err(ResearchError::Cancelled) => return Err(ResearchError::Cancelled),
            Err(e) => {
                warn!(query = %item.query, error = %e, "research: search failed, skipping");
                progress.search_finished(false);
            }
        }
        emit(tx, sent, progress.render()).await?;
    }
    Ok(summaries)
}

async fn search(
    llm: &dyn LlmChat,
    config: ResearchConfig,
    item: &SearchItem,
    cancel: &CancelToken,
) -> Result<Option<String>, ResearchError> {
    let messages = [Message::user(format!(
        "Search term: {}\nReason for searching: {}",
        item.query, item.reason
    ))];
    let response = guarded(cancel, llm.chat(config.max_tokens, SEARCH_PROMPT, &messages, None)).await?;
    log_usage("search", &response);
    Ok(response.text())
}

fn writer_input(query: &str, summaries: &[String]) -> String {
    let mut out = format!("Original query: <user_input>{query}</user_input>\n\nSummarized search results:\n");
    if summaries.is_empty() {
        out.push_str("\n(no search results were available)\n");
    }
    for (i, summary) in summaries.iter().enumerate() {
        let _ = write!(out, "\n### Result {}\n{}\n", i + 1, summary.trim());
    }
    out
}

async fn write_report(
    llm: &dyn LlmChat,
    config: ResearchConfig,
    query: &str,
    summaries: &[String],
    cancel: &CancelToken,
) -> Result<ReportData, ResearchError> {
    let tools = [submit_report_tool()];
    let messages = [Message::user(writer_input(query, summaries))];

    let response =
        guarded(cancel, llm.chat(config.report_max_tokens, WRITER_PROMPT, &messages, Some(&tools))).await?;
    log_usage("write", &response);

    if let Some(report) = response
        .tool_input(SUBMIT_REPORT)
        .and_then(|input| serde_json::from_value::<ReportData>(input.clone()).ok())
    {
        return Ok(report);
    }
    // Some models answer in prose instead of calling the tool.
    response
        .text()
        .map(|text| ReportData { markdown_report: text, ..ReportData::default() })
        .ok_or(ResearchError::EmptyReport)
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
