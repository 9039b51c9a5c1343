use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([A-Za-z0-9_-]+)").unwrap())
}

/// Collect the distinct `#tag` names in raw Markdown.
///
/// Matching is purely lexical: code blocks, headings with no space after
/// `#` and URL fragments all contribute tags.
pub fn extract_tags(markdown: &str) -> BTreeSet<String> {
    tag_re()
        .captures_iter(markdown)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
