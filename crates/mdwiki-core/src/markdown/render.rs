//! Line-oriented Markdown to HTML conversion.
//!
//! Every input line is classified once (heading, rule, list item, quote,
//! fence, paragraph) and emitted as one output block. Adjacent list items of
//! the same kind and adjacent quote lines are merged into one element; there
//! is no document tree and no nesting.

use regex::Regex;
use std::sync::OnceLock;

use crate::utils::escape_html;

/// Prefixes that mark a line as already being markup, so it is not wrapped in `<p>`.
const TAGGED_PREFIXES: &[&str] = &[
    "<h",
    "<ul",
    "<ol",
    "<blockquote",
    "<hr",
    "<pre",
    "<strong>",
    "<em>",
    "<code>",
];

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6}) (.*)$").unwrap())
}

fn ordered_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\. (.*)$").unwrap())
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap())
}

fn italic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*(.+?)\*").unwrap())
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`(.+?)`").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// A block that can absorb following lines of the same kind
enum OpenBlock {
    List(ListKind, Vec<String>),
    Quote(Vec<String>),
    Fence { lang: String, lines: Vec<String> },
}

struct Renderer {
    output: Vec<String>,
    open: Option<OpenBlock>,
}

impl Renderer {
    fn new() -> Self {
        Self {
            output: Vec::new(),
            open: None,
        }
    }

    fn flush(&mut self) {
        let Some(block) = self.open.take() else {
            return;
        };
        let html = match block {
            OpenBlock::List(kind, items) => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", item))
                    .collect();
                format!("<{tag}>{items}</{tag}>", tag = kind.tag())
            }
            OpenBlock::Quote(lines) => format!("<blockquote>{}</blockquote>", lines.join("<br>")),
            OpenBlock::Fence { lang, lines } => {
                let code = escape_html(lines.join("\n").trim());
                if lang.is_empty() {
                    format!("<pre><code>{}</code></pre>", code)
                } else {
                    format!(
                        "<pre><code class=\"language-{}\">{}</code></pre>",
                        escape_html(&lang),
                        code
                    )
                }
            }
        };
        self.output.push(html);
    }

    fn push_list_item(&mut self, kind: ListKind, text: &str) {
        let item = render_inline(text);
        if let Some(OpenBlock::List(open_kind, items)) = self.open.as_mut() {
            if *open_kind == kind {
                items.push(item);
                return;
            }
        }
        self.flush();
        self.open = Some(OpenBlock::List(kind, vec![item]));
    }

    fn push_quote(&mut self, text: &str) {
        let line = render_inline(text);
        if let Some(OpenBlock::Quote(lines)) = self.open.as_mut() {
            lines.push(line);
            return;
        }
        self.flush();
        self.open = Some(OpenBlock::Quote(vec![line]));
    }

    fn push_block(&mut self, html: String) {
        self.flush();
        self.output.push(html);
    }

    fn line(&mut self, raw: &str) {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(OpenBlock::Fence { lines, .. }) = self.open.as_mut() {
            if line.trim_start().starts_with("```") {
                self.flush();
            } else {
                lines.push(line.to_string());
            }
            return;
        }

        // Blank lines emit nothing and do not break list/quote adjacency.
        if line.trim().is_empty() {
            return;
        }

        if let Some(rest) = line.strip_prefix("```") {
            self.flush();
            self.open = Some(OpenBlock::Fence {
                lang: rest.trim().to_string(),
                lines: Vec::new(),
            });
            return;
        }

        if let Some(caps) = heading_re().captures(line) {
            let level = caps[1].len();
            let text = render_inline(caps[2].trim());
            self.push_block(format!("<h{level}>{text}</h{level}>"));
            return;
        }

        if line == "---" {
            self.push_block("<hr>".to_string());
            return;
        }

        if let Some(text) = line.strip_prefix("- ") {
            self.push_list_item(ListKind::Unordered, text);
            return;
        }

        if let Some(caps) = ordered_item_re().captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            self.push_list_item(ListKind::Ordered, text);
            return;
        }

        if let Some(text) = line.strip_prefix("> ") {
            self.push_quote(text);
            return;
        }

        let html = render_inline(line);
        if TAGGED_PREFIXES.iter().any(|prefix| html.starts_with(prefix)) {
            self.push_block(html);
        } else {
            self.push_block(format!("<p>{}</p>", html.trim()));
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.output.join("\n")
    }
}

/// Inline pass: bold before italic so `**` is never read as two `*`, then code spans.
fn render_inline(text: &str) -> String {
    let text = bold_re().replace_all(text, "<strong>$1</strong>");
    let text = italic_re().replace_all(&text, "<em>$1</em>");
    let text = inline_code_re().replace_all(&text, "<code>$1</code>");
    text.into_owned()
}

/// Convert Markdown to HTML.
///
/// Never fails: anything unrecognised falls through to a paragraph. A code
/// fence that is never closed runs to the end of the input.
pub fn render_markdown(markdown: &str) -> String {
    let mut renderer = Renderer::new();
    for line in markdown.split('\n') {
        renderer.line(line);
    }
    renderer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        assert_eq!(render_markdown("# Title\n"), "<h1>Title</h1>");
        assert_eq!(render_markdown("### Third"), "<h3>Third</h3>");
        assert_eq!(render_markdown("###### Six"), "<h6>Six</h6>");
    }

    #[test]
    fn test_heading_requires_space() {
        assert_eq!(render_markdown("#tag"), "<p>#tag</p>");
        assert_eq!(render_markdown("####### seven"), "<p>####### seven</p>");
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            render_markdown("**bold** and *italic*"),
            "<strong>bold</strong> and <em>italic</em>"
        );
    }

    #[test]
    fn test_emphasis_inside_paragraph() {
        assert_eq!(
            render_markdown("Some **bold** text"),
            "<p>Some <strong>bold</strong> text</p>"
        );
    }

    #[test]
    fn test_unordered_list_merged() {
        assert_eq!(render_markdown("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_ordered_list_merged() {
        assert_eq!(
            render_markdown("1. one\n2. two\n10. ten"),
            "<ol><li>one</li><li>two</li><li>ten</li></ol>"
        );
    }

    #[test]
    fn test_list_kinds_not_merged() {
        assert_eq!(
            render_markdown("- a\n1. b"),
            "<ul><li>a</li></ul>\n<ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_blank_line_does_not_split_list() {
        assert_eq!(render_markdown("- a\n\n- b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_paragraph_splits_list() {
        assert_eq!(
            render_markdown("- a\nbetween\n- b"),
            "<ul><li>a</li></ul>\n<p>between</p>\n<ul><li>b</li></ul>"
        );
    }

    #[test]
    fn test_nested_list_is_flat() {
        // Indented items are not list items at all.
        assert_eq!(
            render_markdown("- a\n  - b"),
            "<ul><li>a</li></ul>\n<p>- b</p>"
        );
    }

    #[test]
    fn test_fenced_code_escaped() {
        let md = "```rust\nfn main() { let x = a < b && **c**; }\n```";
        assert_eq!(
            render_markdown(md),
            "<pre><code class=\"language-rust\">fn main() { let x = a &lt; b &amp;&amp; **c**; }</code></pre>"
        );
    }

    #[test]
    fn test_fenced_code_without_language() {
        assert_eq!(
            render_markdown("```\n# not a heading\n- not a list\n```"),
            "<pre><code># not a heading\n- not a list</code></pre>"
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(
            render_markdown("before\n```\n<b>x</b>"),
            "<p>before</p>\n<pre><code>&lt;b&gt;x&lt;/b&gt;</code></pre>"
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render_markdown("`x`"), "<code>x</code>");
        assert_eq!(
            render_markdown("use `cargo` here"),
            "<p>use <code>cargo</code> here</p>"
        );
    }

    #[test]
    fn test_blockquote_merged() {
        assert_eq!(
            render_markdown("> one\n> two"),
            "<blockquote>one<br>two</blockquote>"
        );
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(render_markdown("a\n---\nb"), "<p>a</p>\n<hr>\n<p>b</p>");
    }

    #[test]
    fn test_each_prose_line_is_its_own_paragraph() {
        assert_eq!(
            render_markdown("first line\nsecond line\n\nthird"),
            "<p>first line</p>\n<p>second line</p>\n<p>third</p>"
        );
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(render_markdown("# A\r\n- b\r\n"), "<h1>A</h1>\n<ul><li>b</li></ul>");
    }

    #[test]
    fn test_existing_block_html_not_wrapped() {
        assert_eq!(render_markdown("<hr/>"), "<hr/>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_markdown(""), "");
        assert_eq!(render_markdown("\n\n  \n"), "");
    }
}
