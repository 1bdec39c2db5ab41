//! Structured-output tools for the research pipeline.
//!
//! Neither tool has a server-side effect: the model "calls" it and the
//! research manager reads the arguments as the stage result.

use super::types::Tool;

/// Tool the planner calls with its list of searches.
pub const PLAN_SEARCHES: &str = "plan_searches";

/// Tool the writer calls with the finished report.
pub const SUBMIT_REPORT: &str = "submit_report";

/// Tool definition for the planning stage.
#[must_use]
pub fn plan_searches_tool(search_count: usize) -> Tool {
    Tool {
        name: PLAN_SEARCHES.into(),
        description: format!("Submit the {search_count} web searches that best answer the research query."),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "searches": {
                    "type": "array",
                    "description": "A list of web searches to perform to best answer the query.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "reason": {
                                "type": "string",
                                "description": "Your reasoning for why this search is important to the query."
                            },
                            "query": {
                                "type": "string",
                                "description": "The search term to use for the web search."
                            }
                        },
                        "required": ["reason", "query"]
                    }
                }
            },
            "required": ["searches"]
        }),
    }
}

/// Tool definition for the writing stage.
#[must_use]
pub fn submit_report_tool() -> Tool {
    Tool {
        name: SUBMIT_REPORT.into(),
        description: "Submit the finished research report.".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "short_summary": {
                    "type": "string",
                    "description": "A short 2-3 sentence summary of the findings."
                },
                "markdown_report": {
                    "type": "string",
                    "description": "The final report in markdown."
                },
                "follow_up_questions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Suggested topics to research further."
                }
            },
            "required": ["short_summary", "markdown_report", "follow_up_questions"]
        }),
    }
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;
