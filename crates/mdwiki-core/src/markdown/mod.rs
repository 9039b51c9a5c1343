mod render;
mod tags;
mod wikilink;

use std::collections::BTreeSet;

use crate::model::LinkDescriptor;

pub use render::render_markdown;
pub use tags::extract_tags;
pub use wikilink::{WikiLinkExtractor, DEFAULT_PAGE_URL_PREFIX};

/// Everything derived from one page's Markdown
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub links: Vec<LinkDescriptor>,
    pub tags: BTreeSet<String>,
}

/// Runs the page pipeline: wiki-links are rewritten first, the result is
/// rendered, and tags are read from the original Markdown.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    links: WikiLinkExtractor,
}

impl PageRenderer {
    pub fn new(page_url_prefix: impl Into<String>) -> Self {
        Self {
            links: WikiLinkExtractor::new(page_url_prefix),
        }
    }

    pub fn link_extractor(&self) -> &WikiLinkExtractor {
        &self.links
    }

    pub fn render_page(&self, markdown: &str) -> RenderedPage {
        let (rewritten, links) = self.links.extract(markdown);
        RenderedPage {
            html: render_markdown(&rewritten),
            links,
            tags: extract_tags(markdown),
        }
    }
}
