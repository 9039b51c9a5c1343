use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{SearchMatches, Store};
use crate::error::{Result, WikiError};
use crate::model::{
    Backlink, LinkEdge, LinkId, NewLink, NewPage, Page, PageId, PageSummary, PageUpdate, Tag,
    TagId, WikiCounts,
};

#[derive(Debug, Clone, Default)]
struct State {
    pages: BTreeMap<PageId, Page>,
    slug_map: HashMap<String, PageId>,
    path_map: HashMap<String, PageId>,
    links: BTreeMap<LinkId, LinkEdge>,
    tags: BTreeMap<TagId, Tag>,
    tag_names: HashMap<String, TagId>,
    page_tags: BTreeSet<(PageId, TagId)>,
    next_page_id: i64,
    next_link_id: i64,
    next_tag_id: i64,
}

// In memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: State,
    snapshot: Option<Box<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn summaries<'a>(pages: impl Iterator<Item = &'a Page>) -> Vec<PageSummary> {
        let mut summaries: Vec<PageSummary> = pages.map(PageSummary::from).collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        summaries
    }
}

impl Store for MemoryStore {
    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(WikiError::Storage("transaction already active".to_string()));
        }
        self.snapshot = Some(Box::new(self.state.clone()));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| WikiError::Storage("no active transaction".to_string()))
    }

    fn rollback(&mut self) -> Result<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| WikiError::Storage("no active transaction".to_string()))?;
        self.state = *snapshot;
        Ok(())
    }

    fn page_by_id(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.state.pages.get(&id).cloned())
    }

    fn page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        Ok(self
            .state
            .slug_map
            .get(slug)
            .and_then(|id| self.state.pages.get(id))
            .cloned())
    }

    fn page_by_source_path(&self, source_path: &str) -> Result<Option<Page>> {
        Ok(self
            .state
            .path_map
            .get(source_path)
            .and_then(|id| self.state.pages.get(id))
            .cloned())
    }

    fn insert_page(&mut self, page: NewPage) -> Result<PageId> {
        if self.state.slug_map.contains_key(&page.slug) {
            return Err(WikiError::DuplicateSlug(page.slug));
        }
        if let Some(path) = &page.source_path {
            if self.state.path_map.contains_key(path) {
                return Err(WikiError::Storage(format!(
                    "source path '{}' already imported",
                    path
                )));
            }
        }

        self.state.next_page_id += 1;
        let id = PageId(self.state.next_page_id);

        self.state.slug_map.insert(page.slug.clone(), id);
        if let Some(path) = &page.source_path {
            self.state.path_map.insert(path.clone(), id);
        }
        self.state.pages.insert(
            id,
            Page {
                id,
                title: page.title,
                slug: page.slug,
                markdown: page.markdown,
                html: page.html,
                source_path: page.source_path,
                source_mtime: page.source_mtime,
                created_at: page.timestamp,
                updated_at: page.timestamp,
            },
        );
        Ok(id)
    }

    fn update_page(&mut self, id: PageId, update: PageUpdate) -> Result<()> {
        if let Some(slug) = &update.slug {
            if let Some(owner) = self.state.slug_map.get(slug) {
                if *owner != id {
                    return Err(WikiError::DuplicateSlug(slug.clone()));
                }
            }
        }

        let page = self
            .state
            .pages
            .get_mut(&id)
            .ok_or_else(|| WikiError::PageNotFound(id.to_string()))?;

        if let Some(slug) = update.slug {
            if slug != page.slug {
                self.state.slug_map.remove(&page.slug);
                self.state.slug_map.insert(slug.clone(), id);
                page.slug = slug;
            }
        }
        page.title = update.title;
        page.markdown = update.markdown;
        page.html = update.html;
        if update.source_mtime.is_some() {
            page.source_mtime = update.source_mtime;
        }
        page.updated_at = update.timestamp;
        Ok(())
    }

    fn all_pages(&self) -> Result<Vec<PageSummary>> {
        Ok(Self::summaries(self.state.pages.values()))
    }

    fn recent_pages(&self, limit: usize) -> Result<Vec<PageSummary>> {
        let mut pages: Vec<PageSummary> =
            self.state.pages.values().map(PageSummary::from).collect();
        pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        pages.truncate(limit);
        Ok(pages)
    }

    fn search_pages(&self, needle: &str, limit: usize, offset: usize) -> Result<SearchMatches> {
        let needle = needle.to_ascii_lowercase();
        let mut matches: Vec<(bool, &Page)> = self
            .state
            .pages
            .values()
            .filter_map(|page| {
                let in_title = page.title.to_ascii_lowercase().contains(&needle);
                let in_body = page.markdown.to_ascii_lowercase().contains(&needle);
                (in_title || in_body).then_some((in_title, page))
            })
            .collect();

        matches.sort_by(|(a_title, a), (b_title, b)| {
            b_title
                .cmp(a_title)
                .then(a.title.cmp(&b.title))
                .then(a.id.cmp(&b.id))
        });

        Ok(SearchMatches {
            total: matches.len(),
            pages: matches
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|(_, page)| page.clone())
                .collect(),
        })
    }

    fn titles_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut titles: Vec<String> = self
            .state
            .pages
            .values()
            .filter(|page| page.title.to_ascii_lowercase().starts_with(&prefix))
            .map(|page| page.title.clone())
            .collect();
        titles.sort();
        titles.truncate(limit);
        Ok(titles)
    }

    fn delete_links_from(&mut self, source: PageId) -> Result<usize> {
        let before = self.state.links.len();
        self.state.links.retain(|_, link| link.source != source);
        Ok(before - self.state.links.len())
    }

    fn insert_link(&mut self, link: NewLink) -> Result<LinkId> {
        if !self.state.pages.contains_key(&link.source) {
            return Err(WikiError::PageNotFound(link.source.to_string()));
        }
        self.state.next_link_id += 1;
        let id = LinkId(self.state.next_link_id);
        self.state.links.insert(
            id,
            LinkEdge {
                id,
                source: link.source,
                target: link.target,
                target_name: link.target_name,
                label: link.label,
            },
        );
        Ok(id)
    }

    fn links_from(&self, source: PageId) -> Result<Vec<LinkEdge>> {
        Ok(self
            .state
            .links
            .values()
            .filter(|link| link.source == source)
            .cloned()
            .collect())
    }

    fn backlinks_to(&self, target: PageId) -> Result<Vec<Backlink>> {
        let mut backlinks: Vec<(LinkId, Backlink)> = self
            .state
            .links
            .values()
            .filter(|link| link.target == Some(target))
            .filter_map(|link| {
                self.state.pages.get(&link.source).map(|page| {
                    (
                        link.id,
                        Backlink {
                            source: page.id,
                            title: page.title.clone(),
                            slug: page.slug.clone(),
                            label: link.label.clone(),
                        },
                    )
                })
            })
            .collect();
        backlinks.sort_by(|(a_id, a), (b_id, b)| a.title.cmp(&b.title).then(a_id.cmp(b_id)));
        Ok(backlinks.into_iter().map(|(_, backlink)| backlink).collect())
    }

    fn unresolved_links_matching_titles(&self) -> Result<Vec<LinkEdge>> {
        Ok(self
            .state
            .links
            .values()
            .filter(|link| link.target.is_none())
            .filter(|link| {
                self.state
                    .pages
                    .values()
                    .any(|page| page.title.eq_ignore_ascii_case(&link.target_name))
            })
            .cloned()
            .collect())
    }

    fn set_link_target(&mut self, link: LinkId, target: PageId) -> Result<()> {
        let edge = self
            .state
            .links
            .get_mut(&link)
            .ok_or_else(|| WikiError::Storage(format!("link {} not found", link.0)))?;
        edge.target = Some(target);
        Ok(())
    }

    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self
            .state
            .tag_names
            .get(name)
            .and_then(|id| self.state.tags.get(id))
            .cloned())
    }

    fn insert_tag(&mut self, name: &str) -> Result<TagId> {
        if self.state.tag_names.contains_key(name) {
            return Err(WikiError::Storage(format!("tag '{}' already exists", name)));
        }
        self.state.next_tag_id += 1;
        let id = TagId(self.state.next_tag_id);
        self.state.tag_names.insert(name.to_string(), id);
        self.state.tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    fn delete_page_tags(&mut self, page: PageId) -> Result<usize> {
        let before = self.state.page_tags.len();
        self.state.page_tags.retain(|(owner, _)| *owner != page);
        Ok(before - self.state.page_tags.len())
    }

    fn insert_page_tag(&mut self, page: PageId, tag: TagId) -> Result<()> {
        self.state.page_tags.insert((page, tag));
        Ok(())
    }

    fn tags_of_page(&self, page: PageId) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .state
            .page_tags
            .iter()
            .filter(|(owner, _)| *owner == page)
            .filter_map(|(_, tag)| self.state.tags.get(tag).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn pages_with_tag(&self, name: &str) -> Result<Vec<PageSummary>> {
        let Some(tag) = self.state.tag_names.get(name) else {
            return Ok(Vec::new());
        };
        Ok(Self::summaries(
            self.state
                .page_tags
                .iter()
                .filter(|(_, t)| t == tag)
                .filter_map(|(page, _)| self.state.pages.get(page)),
        ))
    }

    fn tag_counts(&self) -> Result<Vec<(Tag, usize)>> {
        let mut counts: Vec<(Tag, usize)> = self
            .state
            .tags
            .values()
            .map(|tag| {
                let count = self
                    .state
                    .page_tags
                    .iter()
                    .filter(|(_, t)| *t == tag.id)
                    .count();
                (tag.clone(), count)
            })
            .collect();
        counts.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        Ok(counts)
    }

    fn counts(&self) -> Result<WikiCounts> {
        Ok(WikiCounts {
            pages: self.state.pages.len(),
            links: self.state.links.len(),
            unresolved_links: self
                .state
                .links
                .values()
                .filter(|link| link.target.is_none())
                .count(),
            tags: self.state.tags.len(),
        })
    }
}
