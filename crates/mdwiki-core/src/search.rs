//! Substring search over pages with excerpts, highlighting and pagination.

use pulldown_cmark::{Event, Options, Parser, TagEnd};
use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Page, PageId};
use crate::store::Store;
use crate::utils::escape_html;

/// Characters of context kept before the first match in an excerpt
const EXCERPT_LEAD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub updated_at: i64,
    /// Plain-text excerpt, not escaped
    pub excerpt: String,
    /// Escaped HTML with the query wrapped in `<mark>`
    pub title_highlighted: String,
    pub excerpt_highlighted: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub pagination: Pagination,
}

impl SearchResults {
    fn empty() -> Self {
        Self {
            hits: Vec::new(),
            pagination: Pagination {
                current_page: 1,
                total_pages: 0,
                total_results: 0,
                has_previous: false,
                has_next: false,
            },
        }
    }
}

pub struct Searcher<'a> {
    store: &'a dyn Store,
    excerpt_length: usize,
}

impl<'a> Searcher<'a> {
    pub fn new(store: &'a dyn Store, excerpt_length: usize) -> Self {
        Self {
            store,
            excerpt_length,
        }
    }

    /// `page` is 1-based; anything below 1 is treated as the first page.
    pub fn search(&self, query: &str, page: usize, per_page: usize) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::empty());
        }

        let page = page.max(1);
        let per_page = per_page.max(1);
        let matches = self
            .store
            .search_pages(query, per_page, (page - 1).saturating_mul(per_page))?;
        log::debug!(
            "Search '{}' page {}: {} total matches",
            query,
            page,
            matches.total
        );

        let highlighter = Highlighter::new(query);
        let hits = matches
            .pages
            .iter()
            .map(|p| self.hit(p, query, &highlighter))
            .collect();

        let total_pages = matches.total.div_ceil(per_page);
        Ok(SearchResults {
            hits,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_results: matches.total,
                has_previous: page > 1,
                has_next: page < total_pages,
            },
        })
    }

    /// Page titles starting with `prefix`, ascending
    pub fn suggestions(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        if prefix.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.store.titles_with_prefix(prefix, limit)
    }

    fn hit(&self, page: &Page, query: &str, highlighter: &Highlighter) -> SearchHit {
        let excerpt = excerpt(&plain_text(&page.markdown), query, self.excerpt_length);
        SearchHit {
            id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            updated_at: page.updated_at,
            title_highlighted: highlighter.highlight(&page.title),
            excerpt_highlighted: highlighter.highlight(&excerpt),
            excerpt,
        }
    }
}

/// Strip Markdown down to its text, whitespace collapsed. Wiki-links
/// contribute their label.
pub fn plain_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_WIKILINKS);

    let mut text = String::new();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(..)
                | TagEnd::Item
                | TagEnd::BlockQuote(..)
                | TagEnd::CodeBlock
                | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_len` characters of `text`, re-windowed to start a little
/// before the first (ASCII case-insensitive) occurrence of `query`.
fn excerpt(text: &str, query: &str, max_len: usize) -> String {
    let head: String = text.chars().take(max_len).collect();
    let truncated = text.chars().nth(max_len).is_some();
    let suffix = if truncated { "..." } else { "" };

    let position = head
        .to_ascii_lowercase()
        .find(&query.to_ascii_lowercase())
        .map(|byte| head[..byte].chars().count());

    match position {
        Some(pos) if pos > EXCERPT_LEAD => {
            let window: String = head.chars().skip(pos - EXCERPT_LEAD).collect();
            format!("...{}{}", window, suffix)
        }
        _ => format!("{}{}", head, suffix),
    }
}

struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    fn new(query: &str) -> Self {
        let escaped = regex::escape(&escape_html(query));
        let pattern = match Regex::new(&format!(r"(?i)\b({})\b", escaped)) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("Cannot highlight query '{}': {}", query, e);
                None
            }
        };
        Self { pattern }
    }

    /// Escape `text` and wrap whole-word occurrences of the query in `<mark>`.
    fn highlight(&self, text: &str) -> String {
        let escaped = escape_html(text);
        match &self.pattern {
            Some(re) => re.replace_all(&escaped, "<mark>${1}</mark>").into_owned(),
            None => escaped,
        }
    }
}
