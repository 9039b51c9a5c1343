use serde::{Deserialize, Serialize};

/// Row id of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub i64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub markdown: String,
    pub html: String,
    /// Vault-relative path, `/`-separated. `None` for pages created in the editor.
    pub source_path: Option<String>,
    /// Source file mtime (unix ms) as of the last import
    pub source_mtime: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert payload for a page that does not exist yet
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    pub markdown: String,
    pub html: String,
    pub source_path: Option<String>,
    pub source_mtime: Option<i64>,
    pub timestamp: i64,
}

/// In-place update of an existing page. `slug` and `source_mtime` are only
/// written when present.
#[derive(Debug, Clone)]
pub struct PageUpdate {
    pub title: String,
    pub slug: Option<String>,
    pub markdown: String,
    pub html: String,
    pub source_mtime: Option<i64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub updated_at: i64,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            updated_at: page.updated_at,
        }
    }
}

/// A wiki-link as written in Markdown: `[[target_name|label]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub target_name: String,
    pub label: String,
    pub slug: String,
}

/// Persisted link edge. `target` is `None` while the named page does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub id: LinkId,
    pub source: PageId,
    pub target: Option<PageId>,
    pub target_name: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub source: PageId,
    pub target: Option<PageId>,
    pub target_name: String,
    pub label: String,
}

/// Incoming edge, seen from the target page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlink {
    pub source: PageId,
    pub title: String,
    pub slug: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiCounts {
    pub pages: usize,
    pub links: usize,
    pub unresolved_links: usize,
    pub tags: usize,
}
