use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::PageId;
use crate::store::Store;

/// Keeps a page's tag associations in step with its Markdown.
pub struct TagGraph<'a> {
    store: &'a mut dyn Store,
}

impl<'a> TagGraph<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        Self { store }
    }

    /// Replace the page's associations with `names`, creating tags on first use.
    pub fn reconcile(&mut self, page: PageId, names: &BTreeSet<String>) -> Result<()> {
        self.store.delete_page_tags(page)?;

        for name in names {
            let tag = match self.store.tag_by_name(name)? {
                Some(tag) => tag.id,
                None => self.store.insert_tag(name)?,
            };
            self.store.insert_page_tag(page, tag)?;
        }
        Ok(())
    }
}
