use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::WikiConfig;
use crate::error::Result;
use crate::markdown::PageRenderer;
use crate::model::PageId;
use crate::search::{SearchResults, Searcher};
use crate::store::{MemoryStore, SqliteStore, Store};
use crate::vfs::{FileSystem, PhysicalFileSystem};

mod editor;
mod importer;
mod links;
mod queries;
mod tags;

#[cfg(test)]
mod tests;

pub use editor::PageEditor;
pub use importer::{ImportStats, VaultImporter};
pub use links::{BrokenLinkResolver, LinkGraph};
pub use tags::TagGraph;

/// Outcome of an import followed by a broken-link pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub stats: ImportStats,
    pub resolved_links: usize,
}

/// The Wiki acts as the high-level facade for the core.
///
/// Writes (vault import, link resolution, page edits) go through methods that
/// borrow the store exclusively for the duration of the call. Reads are in
/// `queries.rs`.
pub struct Wiki {
    store: Box<dyn Store>,
    fs: Arc<dyn FileSystem>,
    renderer: PageRenderer,
    config: WikiConfig,
}

impl Wiki {
    pub fn new(store: Box<dyn Store>, fs: Arc<dyn FileSystem>, config: WikiConfig) -> Self {
        let renderer = PageRenderer::new(config.site.page_url_prefix.clone());
        Self {
            store,
            fs,
            renderer,
            config,
        }
    }

    /// Open the SQLite database named in the config, on the real file system.
    pub fn open(config: WikiConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.storage.database)?;
        Ok(Self::new(Box::new(store), Arc::new(PhysicalFileSystem), config))
    }

    /// A wiki backed by [`MemoryStore`]; nothing outlives the value.
    pub fn in_memory(config: WikiConfig) -> Self {
        Self::new(Box::new(MemoryStore::new()), Arc::new(PhysicalFileSystem), config)
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    // ------------------------------------------------------------------------
    // Vault sync
    // ------------------------------------------------------------------------

    pub fn import_vault(&mut self, root: &Path) -> Result<ImportStats> {
        VaultImporter::new(self.store.as_mut(), &*self.fs, &self.renderer).import_vault(root)
    }

    pub fn resolve_broken_links(&mut self) -> Result<usize> {
        BrokenLinkResolver::new(self.store.as_mut()).resolve_broken_links()
    }

    /// Import `root`, then resolve links that point at pages this run created.
    pub fn sync_vault(&mut self, root: &Path) -> Result<SyncReport> {
        let stats = self.import_vault(root)?;
        let resolved_links = self.resolve_broken_links()?;
        Ok(SyncReport {
            stats,
            resolved_links,
        })
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    pub fn editor(&mut self) -> PageEditor<'_> {
        PageEditor::new(self.store.as_mut(), &self.renderer)
    }

    pub fn create_page(&mut self, title: &str, markdown: &str) -> Result<PageId> {
        self.editor().create_page(title, markdown)
    }

    pub fn save_page(&mut self, id: PageId, title: &str, markdown: &str) -> Result<()> {
        self.editor().save_page(id, title, markdown)
    }

    pub fn preview(&self, markdown: &str) -> String {
        self.renderer.render_page(markdown).html
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    pub fn searcher(&self) -> Searcher<'_> {
        Searcher::new(self.store.as_ref(), self.config.search.excerpt_length)
    }

    /// Search using the configured page size
    pub fn search(&self, query: &str, page: usize) -> Result<SearchResults> {
        self.searcher()
            .search(query, page, self.config.search.results_per_page)
    }

    pub fn suggestions(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        self.searcher().suggestions(prefix, limit)
    }
}
