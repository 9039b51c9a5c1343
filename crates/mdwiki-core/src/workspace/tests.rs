use super::*;
use crate::error::WikiError;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

fn create_test_wiki() -> (Wiki, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    (Wiki::in_memory(WikiConfig::default()), temp_dir)
}

/// Write a vault file with a fixed mtime so staleness checks do not depend
/// on file system timestamp granularity.
fn write_note(root: &Path, relative: &str, content: &str, mtime_secs: u64) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    set_mtime(&path, mtime_secs);
    path
}

fn set_mtime(path: &Path, mtime_secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(mtime_secs))
        .unwrap();
}

#[test]
fn test_import_creates_pages_links_and_tags() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Home.md", "# Home\n\nGo to [[Other Page]]. #start", 1_000);
    write_note(root, "notes/Other_Page.md", "Back to [[Home|the start]] #start #misc", 1_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.new_files, 2);
    assert_eq!(stats.errors, 0);

    let home = wiki.page_by_slug("home").unwrap().unwrap();
    let other = wiki.page_by_slug("other-page").unwrap().unwrap();
    assert_eq!(other.title, "Other Page");
    assert_eq!(other.source_path.as_deref(), Some("notes/Other_Page.md"));
    assert_eq!(home.source_mtime, Some(1_000_000));
    assert!(home
        .html
        .contains("<a href=\"/page/other-page\" class=\"wiki-link\">Other Page</a>"));

    // Home was imported before Other Page existed, so its edge is still open
    let outgoing = wiki.outgoing_links(home.id).unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].target, None);

    let backlinks = wiki.backlinks(home.id).unwrap();
    assert_eq!(backlinks.len(), 1);
    assert_eq!(backlinks[0].slug, "other-page");
    assert_eq!(backlinks[0].label, "the start");

    let tags: Vec<_> = wiki
        .page_tags(other.id)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tags, vec!["misc", "start"]);
    assert_eq!(wiki.pages_with_tag("start").unwrap().len(), 2);
}

#[test]
fn test_reimport_is_idempotent() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "A.md", "Links to [[B]] #x", 1_000);
    write_note(root, "B.md", "Links to [[A]] #y", 1_000);

    wiki.sync_vault(root).unwrap();
    let counts_before = wiki.counts().unwrap();
    let a_before = wiki.page_by_slug("a").unwrap().unwrap();

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.new_files, 0);
    assert_eq!(stats.updated_files, 0);
    assert_eq!(stats.unchanged_files, 2);

    assert_eq!(wiki.counts().unwrap(), counts_before);
    let a_after = wiki.page_by_slug("a").unwrap().unwrap();
    assert_eq!(a_after, a_before);
}

#[test]
fn test_changed_file_updates_in_place() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    let path = write_note(root, "Daily_Log.md", "Old text [[Gone]] #old", 1_000);
    wiki.import_vault(root).unwrap();
    let before = wiki.page_by_slug("daily-log").unwrap().unwrap();

    fs::write(&path, "New text [[Home]] #new").unwrap();
    set_mtime(&path, 2_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.updated_files, 1);
    assert_eq!(stats.new_files, 0);

    let after = wiki.page_by_slug("daily-log").unwrap().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.markdown, "New text [[Home]] #new");
    assert_eq!(after.source_mtime, Some(2_000_000));

    let links = wiki.outgoing_links(after.id).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_name, "Home");

    let tags: Vec<_> = wiki
        .page_tags(after.id)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tags, vec!["new"]);
}

#[test]
fn test_older_mtime_counts_as_unchanged() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    let path = write_note(root, "Note.md", "first", 5_000);
    wiki.import_vault(root).unwrap();

    fs::write(&path, "second").unwrap();
    set_mtime(&path, 4_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.unchanged_files, 1);
    assert_eq!(wiki.page_by_slug("note").unwrap().unwrap().markdown, "first");
}

#[test]
fn test_slug_collision_does_not_overwrite() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "My Page.md", "the original", 1_000);
    write_note(root, "sub/my_page.md", "the intruder", 1_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.new_files, 1);
    assert_eq!(stats.errors, 1);

    let page = wiki.page_by_slug("my-page").unwrap().unwrap();
    assert_eq!(page.markdown, "the original");
    assert_eq!(page.source_path.as_deref(), Some("My Page.md"));
    assert_eq!(wiki.counts().unwrap().pages, 1);
}

#[test]
fn test_forward_reference_round_trip() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Start.md", "See [[Target Note]]", 1_000);

    let report = wiki.sync_vault(root).unwrap();
    assert_eq!(report.resolved_links, 0);
    let start = wiki.page_by_slug("start").unwrap().unwrap();
    assert_eq!(wiki.outgoing_links(start.id).unwrap()[0].target, None);
    assert_eq!(wiki.counts().unwrap().unresolved_links, 1);

    write_note(root, "Target Note.md", "Here", 1_000);
    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.new_files, 1);
    assert_eq!(stats.unchanged_files, 1);

    let target = wiki.page_by_slug("target-note").unwrap().unwrap();
    assert_eq!(wiki.resolve_broken_links().unwrap(), 1);
    assert_eq!(
        wiki.outgoing_links(start.id).unwrap()[0].target,
        Some(target.id)
    );
    assert_eq!(wiki.resolve_broken_links().unwrap(), 0);
    assert_eq!(wiki.counts().unwrap().unresolved_links, 0);
    assert_eq!(wiki.backlinks(target.id).unwrap()[0].title, "Start");
}

#[test]
fn test_resolver_needs_title_match() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    // Both names slugify to "target-note"; only the second one spells the title
    write_note(root, "Dashed.md", "See [[target-note]]", 1_000);
    write_note(root, "Spaced.md", "See [[target note]]", 1_000);
    wiki.import_vault(root).unwrap();

    write_note(root, "Target Note.md", "Here", 1_000);
    wiki.import_vault(root).unwrap();
    let target = wiki.page_by_slug("target-note").unwrap().unwrap();

    assert_eq!(wiki.resolve_broken_links().unwrap(), 1);

    let dashed = wiki.page_by_slug("dashed").unwrap().unwrap();
    let spaced = wiki.page_by_slug("spaced").unwrap().unwrap();
    assert_eq!(wiki.outgoing_links(dashed.id).unwrap()[0].target, None);
    assert_eq!(
        wiki.outgoing_links(spaced.id).unwrap()[0].target,
        Some(target.id)
    );
}

#[test]
fn test_hidden_entries_and_other_extensions_are_skipped() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Visible.md", "ok", 1_000);
    write_note(root, ".obsidian/workspace.md", "config", 1_000);
    write_note(root, ".Hidden.md", "secret", 1_000);
    write_note(root, "attachment.txt", "text", 1_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.total_files, 1);
    assert_eq!(wiki.all_pages().unwrap().len(), 1);
    assert!(wiki.page_by_slug("hidden").unwrap().is_none());
}

#[test]
fn test_missing_vault_is_fatal() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let missing = temp_dir.path().join("nope");

    let err = wiki.import_vault(&missing).unwrap_err();
    assert!(matches!(err, WikiError::VaultNotFound(ref p) if *p == missing));

    let file = write_note(temp_dir.path(), "file.md", "x", 1_000);
    let err = wiki.import_vault(&file).unwrap_err();
    assert!(matches!(err, WikiError::VaultNotFound(_)));
    assert_eq!(wiki.counts().unwrap().pages, 0);
}

#[test]
fn test_per_file_errors_do_not_stop_the_run() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Alpha.md", "fine", 1_000);
    fs::write(root.join("Broken.md"), [0xff, 0xfe, 0xfd]).unwrap();
    write_note(root, "___.md", "no usable title", 1_000);
    write_note(root, "Zulu.md", "also fine", 1_000);

    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.new_files, 2);
    assert_eq!(stats.errors, 2);
    assert!(wiki.page_by_slug("alpha").unwrap().is_some());
    assert!(wiki.page_by_slug("zulu").unwrap().is_some());
    assert!(wiki.page_by_slug("broken").unwrap().is_none());
}

#[test]
fn test_non_ascii_titles_slug_to_ascii() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Café.md", "Menu #café", 1_000);
    write_note(root, "Links.md", "See [[Caf]] and [[café]]", 1_000);
    write_note(root, "日本.md", "no ascii in the title", 1_000);

    let report = wiki.sync_vault(root).unwrap();
    assert_eq!(report.stats.new_files, 2);
    assert_eq!(report.stats.errors, 1);

    let cafe = wiki.page_by_slug("caf").unwrap().unwrap();
    assert_eq!(cafe.title, "Café");
    let tags: Vec<_> = wiki
        .page_tags(cafe.id)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tags, vec!["caf"]);

    // Both spellings share the slug "caf"
    let links_page = wiki.page_by_slug("links").unwrap().unwrap();
    let targets: Vec<_> = wiki
        .outgoing_links(links_page.id)
        .unwrap()
        .into_iter()
        .map(|l| l.target)
        .collect();
    assert_eq!(targets, vec![Some(cafe.id), Some(cafe.id)]);
}

#[test]
fn test_editor_rejects_title_without_ascii_slug() {
    let (mut wiki, _temp_dir) = create_test_wiki();
    let err = wiki.create_page("日本", "text").unwrap_err();
    assert!(matches!(err, WikiError::InvalidTitle(_)));
}

#[test]
fn test_editor_create_and_save() {
    let (mut wiki, _temp_dir) = create_test_wiki();

    let home = wiki.create_page("Home", "Welcome [[Guide]] #intro").unwrap();
    let guide = wiki.create_page("  Guide  ", "Read [[Home]]").unwrap();

    let guide_page = wiki.page_by_id(guide).unwrap().unwrap();
    assert_eq!(guide_page.title, "Guide");
    assert_eq!(guide_page.slug, "guide");
    assert_eq!(guide_page.source_path, None);
    assert_eq!(wiki.outgoing_links(guide).unwrap()[0].target, Some(home));

    // Home's link to Guide was written before Guide existed
    assert_eq!(wiki.outgoing_links(home).unwrap()[0].target, None);
    assert_eq!(wiki.resolve_broken_links().unwrap(), 1);

    let err = wiki.create_page("home", "dup").unwrap_err();
    assert!(matches!(err, WikiError::DuplicateSlug(ref s) if s == "home"));

    wiki.save_page(home, "Home Base", "Now [[Elsewhere]] #moved").unwrap();
    let saved = wiki.page_by_id(home).unwrap().unwrap();
    assert_eq!(saved.slug, "home-base");
    assert_eq!(saved.title, "Home Base");
    assert!(saved.html.contains("/page/elsewhere"));
    let links = wiki.outgoing_links(home).unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_name, "Elsewhere");
    let tags: Vec<_> = wiki
        .page_tags(home)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tags, vec!["moved"]);
    assert!(wiki.pages_with_tag("intro").unwrap().is_empty());

    // Same title keeps the slug even when content changes
    wiki.save_page(home, "Home Base", "Plain").unwrap();
    assert_eq!(wiki.page_by_id(home).unwrap().unwrap().slug, "home-base");
}

#[test]
fn test_editor_validation() {
    let (mut wiki, _temp_dir) = create_test_wiki();
    let a = wiki.create_page("A", "a").unwrap();
    wiki.create_page("B", "b").unwrap();

    assert!(matches!(
        wiki.create_page("   ", "x").unwrap_err(),
        WikiError::InvalidTitle(_)
    ));
    assert!(matches!(
        wiki.create_page("C", "  \n").unwrap_err(),
        WikiError::EmptyContent
    ));
    assert!(matches!(
        wiki.create_page("!!!", "x").unwrap_err(),
        WikiError::InvalidTitle(_)
    ));
    assert!(matches!(
        wiki.save_page(a, "B", "renamed").unwrap_err(),
        WikiError::DuplicateSlug(_)
    ));
    assert!(matches!(
        wiki.save_page(PageId(999), "Z", "z").unwrap_err(),
        WikiError::PageNotFound(_)
    ));

    // A rejected save leaves the page untouched
    let page = wiki.page_by_id(a).unwrap().unwrap();
    assert_eq!(page.title, "A");
    assert_eq!(page.markdown, "a");
    assert_eq!(wiki.counts().unwrap().pages, 2);
}

#[test]
fn test_editor_change_survives_unchanged_reimport() {
    let (mut wiki, temp_dir) = create_test_wiki();
    let root = temp_dir.path();
    write_note(root, "Note.md", "from disk", 1_000);
    wiki.import_vault(root).unwrap();
    let id = wiki.page_by_slug("note").unwrap().unwrap().id;

    wiki.save_page(id, "Note", "edited in place").unwrap();
    let stats = wiki.import_vault(root).unwrap();
    assert_eq!(stats.unchanged_files, 1);
    assert_eq!(
        wiki.page_by_id(id).unwrap().unwrap().markdown,
        "edited in place"
    );
}

#[test]
fn test_preview_does_not_persist() {
    let (wiki, _temp_dir) = create_test_wiki();
    assert_eq!(wiki.preview("# Draft"), "<h1>Draft</h1>");
    assert_eq!(wiki.counts().unwrap().pages, 0);
}

#[test]
fn test_custom_page_url_prefix() {
    let mut config = WikiConfig::default();
    config.site.page_url_prefix = "/wiki/page.php?slug=".to_string();
    let mut wiki = Wiki::in_memory(config);

    let id = wiki.create_page("Index", "[[Some Page]]").unwrap();
    let html = wiki.page_by_id(id).unwrap().unwrap().html;
    assert!(html.contains("href=\"/wiki/page.php?slug=some-page\""));
}

#[test]
fn test_sqlite_backed_sync_persists() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("vault");
    write_note(&root, "Alpha.md", "[[Beta]] #greek", 1_000);
    write_note(&root, "Beta.md", "[[Alpha]] #greek", 1_000);

    let mut config = WikiConfig::default();
    config.storage.database = temp_dir.path().join("wiki.db");

    {
        let mut wiki = Wiki::open(config.clone()).unwrap();
        let report = wiki.sync_vault(&root).unwrap();
        assert_eq!(report.stats.new_files, 2);
        assert_eq!(report.resolved_links, 1);
    }

    let mut wiki = Wiki::open(config).unwrap();
    let counts = wiki.counts().unwrap();
    assert_eq!(counts.pages, 2);
    assert_eq!(counts.links, 2);
    assert_eq!(counts.unresolved_links, 0);
    assert_eq!(counts.tags, 1);

    let stats = wiki.import_vault(&root).unwrap();
    assert_eq!(stats.unchanged_files, 2);

    let results = wiki.search("alpha", 1).unwrap();
    assert_eq!(results.pagination.total_results, 2);
    assert_eq!(results.hits[0].title, "Alpha");
}
