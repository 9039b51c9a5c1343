use crate::error::Result;
use crate::model::{Backlink, LinkEdge, Page, PageId, PageSummary, Tag, WikiCounts};

use super::Wiki;

impl Wiki {
    pub fn page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        self.store.page_by_slug(slug)
    }

    pub fn page_by_id(&self, id: PageId) -> Result<Option<Page>> {
        self.store.page_by_id(id)
    }

    /// All pages, ordered by title
    pub fn all_pages(&self) -> Result<Vec<PageSummary>> {
        self.store.all_pages()
    }

    pub fn recent_pages(&self, limit: usize) -> Result<Vec<PageSummary>> {
        self.store.recent_pages(limit)
    }

    /// Pages linking to `id`, with the link text each one used
    pub fn backlinks(&self, id: PageId) -> Result<Vec<Backlink>> {
        self.store.backlinks_to(id)
    }

    pub fn outgoing_links(&self, id: PageId) -> Result<Vec<LinkEdge>> {
        self.store.links_from(id)
    }

    pub fn page_tags(&self, id: PageId) -> Result<Vec<Tag>> {
        self.store.tags_of_page(id)
    }

    pub fn pages_with_tag(&self, name: &str) -> Result<Vec<PageSummary>> {
        self.store.pages_with_tag(name)
    }

    pub fn tag_counts(&self) -> Result<Vec<(Tag, usize)>> {
        self.store.tag_counts()
    }

    pub fn counts(&self) -> Result<WikiCounts> {
        self.store.counts()
    }
}
