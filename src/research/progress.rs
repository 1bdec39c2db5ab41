//! Markdown progress document shown while a run is in flight.
//!
//! Every render is the complete document, so each one can replace the
//! previous chunk on screen.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// One planned search: what to look up and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub reason: String,
    pub query: String,
}

/// Final output of the writer stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub short_summary: String,
    #[serde(default)]
    pub markdown_report: String,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl ReportData {
    /// The chunk that ends a successful run.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = self.markdown_report.trim_end().to_string();
        let questions: Vec<&str> = self
            .follow_up_questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();
        if !questions.is_empty() {
            out.push_str("\n\n## Follow-up questions\n\n");
            for q in questions {
                let _ = writeln!(out, "- {q}");
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Planning,
    Searching,
    Writing,
}

/// Accumulated state of a run, rendered as one markdown document.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    query: String,
    stage: Stage,
    plan: Vec<SearchItem>,
    completed: usize,
    failed: usize,
}

impl ProgressReport {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self { query: query.to_string(), stage: Stage::Planning, plan: Vec::new(), completed: 0, failed: 0 }
    }

    pub fn planned(&mut self, plan: &[SearchItem]) {
        self.stage = Stage::Searching;
        self.plan = plan.to_vec();
    }

    /// Record one finished search. `ok == false` means it was skipped.
    pub fn search_finished(&mut self, ok: bool) {
        if ok {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn writing(&mut self) {
        self.stage = Stage::Writing;
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.query.trim().is_empty() {
            out.push_str("# Research\n\n_No topic given._\n\n");
        } else {
            let _ = write!(out, "# Research: {}\n\n", self.query.trim());
        }

        if self.stage == Stage::Planning {
            out.push_str("- Planning searches...\n");
            return out;
        }

        let _ = writeln!(out, "- Planned {} search(es):", self.plan.len());
        for (i, item) in self.plan.iter().enumerate() {
            if item.reason.trim().is_empty() {
                let _ = writeln!(out, "  {}. `{}`", i + 1, item.query);
            } else {
                let _ = writeln!(out, "  {}. `{}` ({})", i + 1, item.query, item.reason.trim());
            }
        }

        let done = self.completed + self.failed;
        match self.stage {
            Stage::Searching => {
                let _ = write!(out, "- Searching... {done}/{} complete", self.plan.len());
            }
            Stage::Writing | Stage::Planning => {
                let _ = write!(out, "- Searches complete: {}/{} succeeded", self.completed, self.plan.len());
            }
        }
        if self.failed > 0 {
            let _ = write!(out, " ({} failed)", self.failed);
        }
        out.push('\n');

        if self.stage == Stage::Writing {
            out.push_str("- Writing report...\n");
        }
        out
    }
}
