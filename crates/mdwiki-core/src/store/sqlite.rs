//! SQLite-backed [`Store`].

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

use super::schema;
use super::{SearchMatches, Store};
use crate::error::{Result, WikiError};
use crate::model::{
    Backlink, LinkEdge, LinkId, NewLink, NewPage, Page, PageId, PageSummary, PageUpdate, Tag,
    TagId, WikiCounts,
};

const PAGE_COLUMNS: &str = "id, title, slug, content_md, content_html, source_path, \
                            source_mtime, created_at, updated_at";

const LINK_COLUMNS: &str = "l.id, l.source_page_id, l.target_page_id, l.page_name, l.link_text";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file. `:memory:` opens a private in-memory database.
    pub fn open(path: &Path) -> Result<Self> {
        let in_memory = path == Path::new(":memory:");
        log::info!("Opening SQLite database at {:?}", path);

        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| WikiError::io(parent, e))?;
                }
            }
            Connection::open(path)?
        };

        if !in_memory {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        }
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        schema::apply_migrations(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_page(row: &Row) -> rusqlite::Result<Page> {
    Ok(Page {
        id: PageId(row.get(0)?),
        title: row.get(1)?,
        slug: row.get(2)?,
        markdown: row.get(3)?,
        html: row.get(4)?,
        source_path: row.get(5)?,
        source_mtime: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_summary(row: &Row) -> rusqlite::Result<PageSummary> {
    Ok(PageSummary {
        id: PageId(row.get(0)?),
        title: row.get(1)?,
        slug: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn row_to_link(row: &Row) -> rusqlite::Result<LinkEdge> {
    Ok(LinkEdge {
        id: LinkId(row.get(0)?),
        source: PageId(row.get(1)?),
        target: row.get::<_, Option<i64>>(2)?.map(PageId),
        target_name: row.get(3)?,
        label: row.get(4)?,
    })
}

/// A unique-constraint failure on `pages.slug` becomes [`WikiError::DuplicateSlug`].
fn map_slug_conflict(err: rusqlite::Error, slug: &str) -> WikiError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.code == ErrorCode::ConstraintViolation && message.contains("pages.slug") {
            return WikiError::DuplicateSlug(slug.to_string());
        }
    }
    WikiError::Sqlite(err)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
fn like_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Store for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            return Err(WikiError::Storage("transaction already active".to_string()));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn page_by_id(&self, id: PageId) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [id.0], row_to_page)
            .optional()?)
    }

    fn page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE slug = ?1", PAGE_COLUMNS);
        Ok(self.conn.query_row(&sql, [slug], row_to_page).optional()?)
    }

    fn page_by_source_path(&self, source_path: &str) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE source_path = ?1", PAGE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [source_path], row_to_page)
            .optional()?)
    }

    fn insert_page(&mut self, page: NewPage) -> Result<PageId> {
        self.conn
            .execute(
                r#"
                INSERT INTO pages
                    (title, slug, content_md, content_html, source_path, source_mtime, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                "#,
                params![
                    page.title,
                    page.slug,
                    page.markdown,
                    page.html,
                    page.source_path,
                    page.source_mtime,
                    page.timestamp,
                ],
            )
            .map_err(|e| map_slug_conflict(e, &page.slug))?;
        Ok(PageId(self.conn.last_insert_rowid()))
    }

    fn update_page(&mut self, id: PageId, update: PageUpdate) -> Result<()> {
        let changed = self
            .conn
            .execute(
                r#"
                UPDATE pages SET
                    title = ?1,
                    slug = COALESCE(?2, slug),
                    content_md = ?3,
                    content_html = ?4,
                    source_mtime = COALESCE(?5, source_mtime),
                    updated_at = ?6
                WHERE id = ?7
                "#,
                params![
                    update.title,
                    update.slug,
                    update.markdown,
                    update.html,
                    update.source_mtime,
                    update.timestamp,
                    id.0,
                ],
            )
            .map_err(|e| map_slug_conflict(e, update.slug.as_deref().unwrap_or_default()))?;

        if changed == 0 {
            return Err(WikiError::PageNotFound(id.to_string()));
        }
        Ok(())
    }

    fn all_pages(&self) -> Result<Vec<PageSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, slug, updated_at FROM pages ORDER BY title, id")?;
        let pages = stmt
            .query_map([], row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn recent_pages(&self, limit: usize) -> Result<Vec<PageSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, slug, updated_at FROM pages ORDER BY updated_at DESC, id DESC LIMIT ?1",
        )?;
        let pages = stmt
            .query_map([limit as i64], row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn search_pages(&self, needle: &str, limit: usize, offset: usize) -> Result<SearchMatches> {
        let pattern = format!("%{}%", like_escape(needle));

        let total: i64 = self.conn.query_row(
            r"SELECT COUNT(*) FROM pages
              WHERE title LIKE ?1 ESCAPE '\' OR content_md LIKE ?1 ESCAPE '\'",
            [&pattern],
            |row| row.get(0),
        )?;

        let sql = format!(
            r"SELECT {} FROM pages
              WHERE title LIKE ?1 ESCAPE '\' OR content_md LIKE ?1 ESCAPE '\'
              ORDER BY CASE WHEN title LIKE ?1 ESCAPE '\' THEN 1 ELSE 2 END, title ASC, id ASC
              LIMIT ?2 OFFSET ?3",
            PAGE_COLUMNS
        );
        // SQLite reads a negative OFFSET as zero
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![pattern, limit, offset], row_to_page)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(SearchMatches {
            total: total as usize,
            pages,
        })
    }

    fn titles_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = format!("{}%", like_escape(prefix));
        let mut stmt = self.conn.prepare(
            r"SELECT title FROM pages WHERE title LIKE ?1 ESCAPE '\' ORDER BY title ASC LIMIT ?2",
        )?;
        let titles = stmt
            .query_map(params![pattern, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }

    fn delete_links_from(&mut self, source: PageId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM links WHERE source_page_id = ?1", [source.0])?)
    }

    fn insert_link(&mut self, link: NewLink) -> Result<LinkId> {
        self.conn.execute(
            "INSERT INTO links (source_page_id, target_page_id, page_name, link_text)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                link.source.0,
                link.target.map(|t| t.0),
                link.target_name,
                link.label,
            ],
        )?;
        Ok(LinkId(self.conn.last_insert_rowid()))
    }

    fn links_from(&self, source: PageId) -> Result<Vec<LinkEdge>> {
        let sql = format!(
            "SELECT {} FROM links l WHERE l.source_page_id = ?1 ORDER BY l.id",
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([source.0], row_to_link)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    fn backlinks_to(&self, target: PageId) -> Result<Vec<Backlink>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.title, p.slug, l.link_text
            FROM links l
            JOIN pages p ON l.source_page_id = p.id
            WHERE l.target_page_id = ?1
            ORDER BY p.title, l.id
            "#,
        )?;
        let backlinks = stmt
            .query_map([target.0], |row| {
                Ok(Backlink {
                    source: PageId(row.get(0)?),
                    title: row.get(1)?,
                    slug: row.get(2)?,
                    label: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(backlinks)
    }

    fn unresolved_links_matching_titles(&self) -> Result<Vec<LinkEdge>> {
        let sql = format!(
            r#"
            SELECT {} FROM links l
            WHERE l.target_page_id IS NULL
              AND EXISTS (SELECT 1 FROM pages p WHERE p.title = l.page_name COLLATE NOCASE)
            ORDER BY l.id
            "#,
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([], row_to_link)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    fn set_link_target(&mut self, link: LinkId, target: PageId) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE links SET target_page_id = ?1 WHERE id = ?2",
            [target.0, link.0],
        )?;
        if changed == 0 {
            return Err(WikiError::Storage(format!("link {} not found", link.0)));
        }
        Ok(())
    }

    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self
            .conn
            .query_row("SELECT id, name FROM tags WHERE name = ?1", [name], |row| {
                Ok(Tag {
                    id: TagId(row.get(0)?),
                    name: row.get(1)?,
                })
            })
            .optional()?)
    }

    fn insert_tag(&mut self, name: &str) -> Result<TagId> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", [name])?;
        Ok(TagId(self.conn.last_insert_rowid()))
    }

    fn delete_page_tags(&mut self, page: PageId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM page_tags WHERE page_id = ?1", [page.0])?)
    }

    fn insert_page_tag(&mut self, page: PageId, tag: TagId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO page_tags (page_id, tag_id) VALUES (?1, ?2)",
            [page.0, tag.0],
        )?;
        Ok(())
    }

    fn tags_of_page(&self, page: PageId) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name FROM tags t
            JOIN page_tags pt ON pt.tag_id = t.id
            WHERE pt.page_id = ?1
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([page.0], |row| {
                Ok(Tag {
                    id: TagId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn pages_with_tag(&self, name: &str) -> Result<Vec<PageSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.title, p.slug, p.updated_at FROM pages p
            JOIN page_tags pt ON pt.page_id = p.id
            JOIN tags t ON t.id = pt.tag_id
            WHERE t.name = ?1
            ORDER BY p.title, p.id
            "#,
        )?;
        let pages = stmt
            .query_map([name], row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pages)
    }

    fn tag_counts(&self) -> Result<Vec<(Tag, usize)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, COUNT(pt.page_id) FROM tags t
            LEFT JOIN page_tags pt ON pt.tag_id = t.id
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((
                    Tag {
                        id: TagId(row.get(0)?),
                        name: row.get(1)?,
                    },
                    row.get::<_, i64>(2)? as usize,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    fn counts(&self) -> Result<WikiCounts> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(WikiCounts {
            pages: count("SELECT COUNT(*) FROM pages")?,
            links: count("SELECT COUNT(*) FROM links")?,
            unresolved_links: count("SELECT COUNT(*) FROM links WHERE target_page_id IS NULL")?,
            tags: count("SELECT COUNT(*) FROM tags")?,
        })
    }
}
