//! Storage capability for pages, link edges, tags and page-tag associations.
//!
//! Components never open storage themselves; they borrow a `&mut dyn Store`
//! for the duration of one operation.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{
    Backlink, LinkEdge, LinkId, NewLink, NewPage, Page, PageId, PageSummary, PageUpdate, Tag,
    TagId, WikiCounts,
};

/// One page of substring-search matches plus the total match count
#[derive(Debug, Clone, Default)]
pub struct SearchMatches {
    pub total: usize,
    pub pages: Vec<Page>,
}

pub trait Store: Send {
    // --- Transactions ---

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;

    // --- Pages ---

    fn page_by_id(&self, id: PageId) -> Result<Option<Page>>;
    fn page_by_slug(&self, slug: &str) -> Result<Option<Page>>;
    fn page_by_source_path(&self, source_path: &str) -> Result<Option<Page>>;
    fn insert_page(&mut self, page: NewPage) -> Result<PageId>;
    fn update_page(&mut self, id: PageId, update: PageUpdate) -> Result<()>;

    /// All pages ordered by title
    fn all_pages(&self) -> Result<Vec<PageSummary>>;

    /// Most recently updated first
    fn recent_pages(&self, limit: usize) -> Result<Vec<PageSummary>>;

    /// Case-insensitive substring match on title or Markdown. Title matches
    /// sort first, then by title.
    fn search_pages(&self, needle: &str, limit: usize, offset: usize) -> Result<SearchMatches>;

    /// Titles starting with `prefix` (case-insensitive), ascending
    fn titles_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    // --- Link edges ---

    fn delete_links_from(&mut self, source: PageId) -> Result<usize>;
    fn insert_link(&mut self, link: NewLink) -> Result<LinkId>;

    /// Outgoing edges in insertion order
    fn links_from(&self, source: PageId) -> Result<Vec<LinkEdge>>;

    /// Incoming edges, ordered by source page title
    fn backlinks_to(&self, target: PageId) -> Result<Vec<Backlink>>;

    /// Unresolved edges whose target name equals (ASCII case-insensitively)
    /// the title of an existing page
    fn unresolved_links_matching_titles(&self) -> Result<Vec<LinkEdge>>;

    fn set_link_target(&mut self, link: LinkId, target: PageId) -> Result<()>;

    // --- Tags ---

    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>>;
    fn insert_tag(&mut self, name: &str) -> Result<TagId>;
    fn delete_page_tags(&mut self, page: PageId) -> Result<usize>;
    fn insert_page_tag(&mut self, page: PageId, tag: TagId) -> Result<()>;

    /// Tags of a page, ordered by name
    fn tags_of_page(&self, page: PageId) -> Result<Vec<Tag>>;

    /// Pages carrying the named tag, ordered by title
    fn pages_with_tag(&self, name: &str) -> Result<Vec<PageSummary>>;

    /// Every tag with the number of pages carrying it, ordered by name
    fn tag_counts(&self) -> Result<Vec<(Tag, usize)>>;

    fn counts(&self) -> Result<WikiCounts>;
}

/// Run `f` inside one storage transaction: committed on `Ok`, rolled back on `Err`.
pub fn with_transaction<T, F>(store: &mut dyn Store, f: F) -> Result<T>
where
    F: FnOnce(&mut dyn Store) -> Result<T>,
{
    store.begin()?;
    match f(&mut *store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback() {
                log::warn!("Rollback failed after '{}': {}", e, rollback_err);
            }
            Err(e)
        }
    }
}
