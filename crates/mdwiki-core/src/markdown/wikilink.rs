use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::model::LinkDescriptor;
use crate::utils::slugify;

/// Default route prefix for page anchors
pub const DEFAULT_PAGE_URL_PREFIX: &str = "/page/";

fn wiki_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Obsidian order: [[target|label]]. `.` never crosses a newline.
    RE.get_or_init(|| Regex::new(r"\[\[(.*?)(?:\|(.*?))?\]\]").unwrap())
}

/// Rewrites `[[Target]]` / `[[Target|Label]]` into anchors and records each link.
#[derive(Debug, Clone)]
pub struct WikiLinkExtractor {
    page_url_prefix: String,
}

impl Default for WikiLinkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_URL_PREFIX)
    }
}

impl WikiLinkExtractor {
    pub fn new(page_url_prefix: impl Into<String>) -> Self {
        Self {
            page_url_prefix: page_url_prefix.into(),
        }
    }

    pub fn page_url(&self, slug: &str) -> String {
        format!("{}{}", self.page_url_prefix, slug)
    }

    /// Returns the rewritten Markdown and the links in order of appearance.
    /// Repeated links are kept, one descriptor per occurrence.
    pub fn extract(&self, markdown: &str) -> (String, Vec<LinkDescriptor>) {
        let mut links = Vec::new();

        let rewritten = wiki_link_re().replace_all(markdown, |caps: &Captures| {
            let target_name = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
            let label = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| target_name.clone());
            let slug = slugify(&target_name);

            let anchor = format!(
                "<a href=\"{}\" class=\"wiki-link\">{}</a>",
                self.page_url(&slug),
                label
            );

            links.push(LinkDescriptor {
                target_name,
                label,
                slug,
            });
            anchor
        });

        (rewritten.into_owned(), links)
    }
}
