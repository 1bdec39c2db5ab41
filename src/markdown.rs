//! Markdown → HTML for report chunks.

use pulldown_cmark::{Event, Options, Parser, html};

/// Render a report chunk for the browser.
///
/// Raw HTML in the chunk is shown as literal text, never injected.
#[must_use]
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_lists() {
        let html = render_html("# Report\n\n- one\n- two\n");
        assert!(html.contains("<h1>Report</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn renders_tables() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn escapes_block_html() {
        let html = render_html("<script>alert(1)</script>\n");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn escapes_inline_html() {
        let html = render_html("hello <img src=x onerror=alert(1)> world");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_html(""), "");
    }
}
