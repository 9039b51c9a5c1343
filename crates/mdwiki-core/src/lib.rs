//! mdwiki Core Library
//!
//! Markdown rendering, wiki-link/tag extraction, the page/link/tag graph and
//! the vault importer. Storage is reached only through the [`Store`] trait.
//!

pub mod config;
pub mod error;
pub mod markdown;
pub mod model;
pub mod search;
pub mod store;
pub mod utils;
pub mod vfs;
pub mod workspace;

pub use config::WikiConfig;
pub use error::{Result, WikiError};
pub use markdown::{extract_tags, render_markdown, PageRenderer, WikiLinkExtractor};
pub use model::{LinkDescriptor, Page, PageId};
pub use search::{SearchResults, Searcher};
pub use store::{MemoryStore, SqliteStore, Store};
pub use utils::slugify;
pub use workspace::{BrokenLinkResolver, ImportStats, PageEditor, SyncReport, VaultImporter, Wiki};
