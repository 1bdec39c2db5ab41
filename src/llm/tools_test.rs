use super::*;

#[test]
fn schema_shape_is_object() {
    for tool in [plan_searches_tool(5), submit_report_tool()] {
        assert_eq!(
            tool.input_schema.get("type").and_then(|v| v.as_str()),
            Some("object"),
            "tool {} schema should be type=object",
            tool.name
        );
    }
}

#[test]
fn plan_tool_mentions_search_count() {
    let tool = plan_searches_tool(3);
    assert_eq!(tool.name, PLAN_SEARCHES);
    assert!(tool.description.contains('3'));
    assert_eq!(tool.input_schema["required"], serde_json::json!(["searches"]));
}

#[test]
fn report_tool_requires_all_fields() {
    let tool = submit_report_tool();
    assert_eq!(tool.name, SUBMIT_REPORT);
    let required = tool.input_schema["required"].as_array().unwrap();
    let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
    assert_eq!(names, ["short_summary", "markdown_report", "follow_up_questions"]);
}
