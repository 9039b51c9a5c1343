use crate::error::Result;
use crate::model::{LinkDescriptor, NewLink, PageId};
use crate::store::{with_transaction, Store};
use crate::utils::slugify;

/// Keeps a page's outgoing link edges in step with its Markdown.
pub struct LinkGraph<'a> {
    store: &'a mut dyn Store,
}

impl<'a> LinkGraph<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        Self { store }
    }

    /// Replace every edge owned by `source` with one edge per descriptor.
    /// Targets that do not exist yet are stored as unresolved.
    ///
    /// Returns the number of edges written.
    pub fn reconcile(&mut self, source: PageId, links: &[LinkDescriptor]) -> Result<usize> {
        let removed = self.store.delete_links_from(source)?;

        for link in links {
            let target = self.store.page_by_slug(&link.slug)?.map(|page| page.id);
            self.store.insert_link(NewLink {
                source,
                target,
                target_name: link.target_name.clone(),
                label: link.label.clone(),
            })?;
        }

        log::debug!(
            "Page {}: replaced {} link(s) with {}",
            source,
            removed,
            links.len()
        );
        Ok(links.len())
    }
}

/// Points unresolved edges at pages that have appeared since the edge was written.
pub struct BrokenLinkResolver<'a> {
    store: &'a mut dyn Store,
}

impl<'a> BrokenLinkResolver<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        Self { store }
    }

    /// Returns how many edges were resolved. Running it again right away
    /// resolves nothing.
    pub fn resolve_broken_links(&mut self) -> Result<usize> {
        let candidates = self.store.unresolved_links_matching_titles()?;
        if candidates.is_empty() {
            return Ok(0);
        }

        let resolved = with_transaction(&mut *self.store, |store| {
            let mut resolved = 0;
            for link in &candidates {
                if let Some(page) = store.page_by_slug(&slugify(&link.target_name))? {
                    store.set_link_target(link.id, page.id)?;
                    resolved += 1;
                }
            }
            Ok(resolved)
        })?;

        log::info!(
            "Resolved {} of {} broken link candidate(s)",
            resolved,
            candidates.len()
        );
        Ok(resolved)
    }
}
