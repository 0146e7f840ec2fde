//! Markdown → HTML fragment conversion.
//!
//! Parsing uses pulldown-cmark with the "extra" family of extensions enabled
//! (tables, footnotes, definition lists, strikethrough, task lists, heading
//! attributes). The event stream is passed through unchanged except for two
//! rewrites:
//!
//! - fenced code blocks are buffered and replaced with highlighted HTML
//!   (see [`super::highlight`]);
//! - raw HTML is turned into text when [`MarkdownOptions::raw_html`] is off,
//!   so it shows up literally in the PDF instead of being interpreted.
//!
//! CommonMark parsing cannot fail: anything the parser does not recognise is
//! emitted as literal text.

use super::highlight::{highlight_code, language_token};
use pulldown_cmark::{html, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use tracing::debug;

/// Switches controlling how Markdown becomes HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Pass raw HTML through to the document. Default: true.
    pub raw_html: bool,
    /// Syntax-highlight fenced code blocks with a known language. Default: true.
    pub highlight: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            raw_html: true,
            highlight: true,
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Convert Markdown text to an HTML fragment.
pub fn markdown_to_html(markdown: &str, opts: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(markdown, parser_options());

    let mut events: Vec<Event<'_>> = Vec::new();
    // (language, accumulated source) of the code block being read
    let mut code: Option<(Option<String>, String)> = None;
    let mut code_blocks = 0usize;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => language_token(&info).map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code = Some((lang, String::new()));
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, buf)) = code.take() {
                    code_blocks += 1;
                    let block = render_code_block(lang.as_deref(), &buf, opts.highlight);
                    events.push(Event::Html(block.into()));
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) if !opts.raw_html => {
                events.push(Event::Text(raw));
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    debug!(
        "Markdown → HTML: {} bytes in, {} bytes out, {} code blocks",
        markdown.len(),
        out.len(),
        code_blocks
    );
    out
}

/// Render one code block as `<pre class="codehilite"><code …>…</code></pre>`.
fn render_code_block(lang: Option<&str>, source: &str, highlight: bool) -> String {
    let body = match lang {
        Some(l) if highlight => highlight_code(source, l).unwrap_or_else(|| escape_html(source)),
        _ => escape_html(source),
    };
    match lang {
        Some(l) => format!(
            "<pre class=\"codehilite\"><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(l),
            body
        ),
        None => format!("<pre class=\"codehilite\"><code>{body}</code></pre>\n"),
    }
}

/// Text of the first level-1 heading, used as a fallback document title.
pub fn first_heading(markdown: &str) -> Option<String> {
    let mut in_h1 = false;
    let mut title = String::new();
    for event in Parser::new_ext(markdown, parser_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_h1 = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let t = title.trim();
                return (!t.is_empty()).then(|| t.to_string());
            }
            Event::Text(t) | Event::Code(t) if in_h1 => title.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_h1 => title.push(' '),
            _ => {}
        }
    }
    None
}

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_html(md: &str) -> String {
        markdown_to_html(md, &MarkdownOptions::default())
    }

    #[test]
    fn heading_and_emphasis() {
        let html = to_html("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
        assert!(html.contains("<em>text</em>"), "got: {html}");
    }

    #[test]
    fn fenced_code_becomes_pre_code() {
        let html = to_html("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre class=\"codehilite\">"), "got: {html}");
        assert!(html.contains("<code class=\"language-rust\">"), "got: {html}");
        assert!(html.contains("hl-"), "expected highlight spans: {html}");
        assert!(html.contains("</code></pre>"));
    }

    #[test]
    fn code_without_highlighting_is_escaped() {
        let opts = MarkdownOptions {
            highlight: false,
            ..MarkdownOptions::default()
        };
        let html = markdown_to_html("```html\n<div>&</div>\n```\n", &opts);
        assert!(html.contains("&lt;div&gt;&amp;&lt;/div&gt;"), "got: {html}");
        assert!(!html.contains("hl-"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let html = to_html("```klingon\nqapla'\n```\n");
        assert!(html.contains("language-klingon"));
        assert!(html.contains("qapla&#39;"), "got: {html}");
    }

    #[test]
    fn indented_code_block() {
        let html = to_html("para\n\n    let x = 1;\n");
        assert!(html.contains("<pre class=\"codehilite\"><code>let x = 1;"), "got: {html}");
    }

    #[test]
    fn tables_render_with_header_cells() {
        let html = to_html("| A | B |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"), "got: {html}");
        assert!(html.contains("<td>1</td>"), "got: {html}");
    }

    #[test]
    fn footnotes_and_definition_lists() {
        let html = to_html("Text[^n]\n\n[^n]: The note.\n");
        assert!(html.contains("footnote-definition"), "got: {html}");

        let html = to_html("Term\n: Definition\n");
        assert!(html.contains("<dl>"), "got: {html}");
        assert!(html.contains("<dt>Term</dt>"), "got: {html}");
    }

    #[test]
    fn task_list_renders_checkbox_input() {
        let html = to_html("- [x] done\n- [ ] todo\n");
        assert!(html.contains("type=\"checkbox\""), "got: {html}");
    }

    #[test]
    fn raw_html_passes_through_by_default() {
        let html = to_html("<div class=\"note\">hi</div>\n");
        assert!(html.contains("<div class=\"note\">"));
    }

    #[test]
    fn raw_html_escaped_when_disabled() {
        let opts = MarkdownOptions {
            raw_html: false,
            ..MarkdownOptions::default()
        };
        let html = markdown_to_html("a <b>bold</b> move\n\n<script>x()</script>\n", &opts);
        assert!(!html.contains("<script>"), "got: {html}");
        assert!(html.contains("&lt;script&gt;"), "got: {html}");
        assert!(html.contains("&lt;b&gt;"), "got: {html}");
    }

    #[test]
    fn malformed_markdown_degrades_to_text() {
        let html = to_html("**unclosed *emphasis [link](\n| not | a table");
        assert!(html.contains("unclosed"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn empty_input_produces_empty_fragment() {
        assert_eq!(to_html(""), "");
    }

    #[test]
    fn first_heading_extraction() {
        assert_eq!(
            first_heading("intro\n\n# The `md2pdf` Guide\n\n# Second").as_deref(),
            Some("The md2pdf Guide")
        );
        assert_eq!(first_heading("## Only h2"), None);
        assert_eq!(first_heading(""), None);
    }

    #[test]
    fn escape_html_handles_all_specials() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
