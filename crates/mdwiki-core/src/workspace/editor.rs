use super::links::LinkGraph;
use super::tags::TagGraph;
use crate::error::{Result, WikiError};
use crate::markdown::PageRenderer;
use crate::model::{NewPage, PageId, PageUpdate};
use crate::store::{with_transaction, Store};
use crate::utils::{slugify, time};

/// Creates and edits pages directly in the store. Pages created here have no
/// source file, and edits are not written back to the vault.
pub struct PageEditor<'a> {
    store: &'a mut dyn Store,
    renderer: &'a PageRenderer,
}

/// Trimmed title and its slug, or the validation failure.
fn validate(title: &str, markdown: &str) -> Result<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(WikiError::InvalidTitle(title.to_string()));
    }
    if markdown.trim().is_empty() {
        return Err(WikiError::EmptyContent);
    }
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(WikiError::InvalidTitle(title.to_string()));
    }
    Ok((title.to_string(), slug))
}

impl<'a> PageEditor<'a> {
    pub fn new(store: &'a mut dyn Store, renderer: &'a PageRenderer) -> Self {
        Self { store, renderer }
    }

    pub fn create_page(&mut self, title: &str, markdown: &str) -> Result<PageId> {
        let (title, slug) = validate(title, markdown)?;
        let rendered = self.renderer.render_page(markdown);
        let now = time::now();

        let id = with_transaction(&mut *self.store, |store| {
            if store.page_by_slug(&slug)?.is_some() {
                return Err(WikiError::DuplicateSlug(slug));
            }
            let id = store.insert_page(NewPage {
                title,
                slug,
                markdown: markdown.to_string(),
                html: rendered.html,
                source_path: None,
                source_mtime: None,
                timestamp: now,
            })?;
            LinkGraph::new(&mut *store).reconcile(id, &rendered.links)?;
            TagGraph::new(&mut *store).reconcile(id, &rendered.tags)?;
            Ok(id)
        })?;

        log::info!("Created page {}", id);
        Ok(id)
    }

    /// Re-render and store new content. The slug follows the title only when
    /// the title changed.
    pub fn save_page(&mut self, id: PageId, title: &str, markdown: &str) -> Result<()> {
        let (title, new_slug) = validate(title, markdown)?;
        let page = self
            .store
            .page_by_id(id)?
            .ok_or_else(|| WikiError::PageNotFound(id.to_string()))?;

        let slug = if title != page.title && new_slug != page.slug {
            Some(new_slug)
        } else {
            None
        };
        let rendered = self.renderer.render_page(markdown);
        let now = time::now();

        with_transaction(&mut *self.store, |store| {
            if let Some(slug) = &slug {
                if store.page_by_slug(slug)?.is_some() {
                    return Err(WikiError::DuplicateSlug(slug.clone()));
                }
            }
            store.update_page(
                id,
                PageUpdate {
                    title,
                    slug,
                    markdown: markdown.to_string(),
                    html: rendered.html,
                    source_mtime: None,
                    timestamp: now,
                },
            )?;
            LinkGraph::new(&mut *store).reconcile(id, &rendered.links)?;
            TagGraph::new(&mut *store).reconcile(id, &rendered.tags)?;
            Ok(())
        })?;

        log::info!("Saved page {}", id);
        Ok(())
    }

    /// Render without persisting anything.
    pub fn preview(&self, markdown: &str) -> String {
        self.renderer.render_page(markdown).html
    }
}
