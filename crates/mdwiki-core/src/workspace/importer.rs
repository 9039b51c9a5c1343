use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use super::links::LinkGraph;
use super::tags::TagGraph;
use crate::error::{Result, WikiError};
use crate::markdown::PageRenderer;
use crate::model::{NewPage, PageId, PageUpdate};
use crate::store::{with_transaction, Store};
use crate::utils::{normalize_source_path, slugify, time, title_from_path};
use crate::vfs::FileSystem;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ImportStats {
    pub total_files: usize,
    pub new_files: usize,
    pub updated_files: usize,
    pub unchanged_files: usize,
    pub errors: usize,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    New,
    Updated,
    Unchanged,
}

/// Mirrors a vault directory into the store.
/// It bridges I/O (FileSystem) and the page/link/tag graph.
pub struct VaultImporter<'a> {
    store: &'a mut dyn Store,
    fs: &'a dyn FileSystem,
    renderer: &'a PageRenderer,
    stats: ImportStats,
}

impl<'a> VaultImporter<'a> {
    pub fn new(
        store: &'a mut dyn Store,
        fs: &'a dyn FileSystem,
        renderer: &'a PageRenderer,
    ) -> Self {
        Self {
            store,
            fs,
            renderer,
            stats: ImportStats::default(),
        }
    }

    /// Imports every Markdown file under `root`. A file that fails is
    /// counted in `errors` and the run continues with the next one.
    pub fn import_vault(&mut self, root: &Path) -> Result<ImportStats> {
        if !self.fs.is_dir(root) {
            return Err(WikiError::VaultNotFound(root.to_path_buf()));
        }

        let started = Instant::now();
        self.stats = ImportStats::default();
        log::info!("Importing vault {:?}", root);

        let files = self.fs.list_files(root, "md");
        self.stats.total_files = files.len();

        for path in &files {
            match self.import_file(root, path) {
                Ok(FileOutcome::New) => self.stats.new_files += 1,
                Ok(FileOutcome::Updated) => self.stats.updated_files += 1,
                Ok(FileOutcome::Unchanged) => self.stats.unchanged_files += 1,
                Err(e) => {
                    self.stats.errors += 1;
                    log::warn!("Failed to import {:?}: {}", path, e);
                }
            }
        }

        self.stats.duration_seconds = started.elapsed().as_secs_f64();
        log::info!(
            "Imported {} file(s): {} new, {} updated, {} unchanged, {} error(s) in {:.2}s",
            self.stats.total_files,
            self.stats.new_files,
            self.stats.updated_files,
            self.stats.unchanged_files,
            self.stats.errors,
            self.stats.duration_seconds
        );

        Ok(self.stats.clone())
    }

    fn import_file(&mut self, root: &Path, path: &Path) -> Result<FileOutcome> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let source_path = normalize_source_path(relative);

        let metadata = self.fs.metadata(path).map_err(|e| WikiError::io(path, e))?;
        let mtime = time::to_millis(metadata.mtime);

        // Staleness check: the stored mtime is the file's mtime at its last import
        let existing = self.store.page_by_source_path(&source_path)?;
        if let Some(page) = &existing {
            if page.source_mtime.is_some_and(|stored| stored >= mtime) {
                log::debug!("Unchanged: {}", source_path);
                return Ok(FileOutcome::Unchanged);
            }
        }

        let markdown = self
            .fs
            .read_to_string(path)
            .map_err(|e| WikiError::io(path, e))?;
        let title = title_from_path(relative);
        let rendered = self.renderer.render_page(&markdown);
        let now = time::now();

        with_transaction(&mut *self.store, |store| {
            let (id, outcome): (PageId, FileOutcome) = match existing {
                Some(page) => {
                    store.update_page(
                        page.id,
                        PageUpdate {
                            title,
                            slug: None,
                            markdown,
                            html: rendered.html,
                            source_mtime: Some(mtime),
                            timestamp: now,
                        },
                    )?;
                    (page.id, FileOutcome::Updated)
                }
                None => {
                    let slug = slugify(&title);
                    if slug.is_empty() {
                        return Err(WikiError::InvalidTitle(title));
                    }
                    if store.page_by_slug(&slug)?.is_some() {
                        return Err(WikiError::DuplicateSlug(slug));
                    }
                    let id = store.insert_page(NewPage {
                        title,
                        slug,
                        markdown,
                        html: rendered.html,
                        source_path: Some(source_path.clone()),
                        source_mtime: Some(mtime),
                        timestamp: now,
                    })?;
                    (id, FileOutcome::New)
                }
            };

            LinkGraph::new(&mut *store).reconcile(id, &rendered.links)?;
            TagGraph::new(&mut *store).reconcile(id, &rendered.tags)?;
            log::debug!("{:?}: {} (page {})", outcome, source_path, id);
            Ok(outcome)
        })
    }
}
