pub mod time;

use std::path::Path;

/// Normalize a vault-relative file path to its stored source-path key.
///
/// Backslashes become forward slashes so the same vault produces the same
/// keys on every platform.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mdwiki_core::utils::normalize_source_path;
///
/// assert_eq!(normalize_source_path(Path::new("foo/bar.md")), "foo/bar.md");
/// assert_eq!(normalize_source_path(Path::new("note.md")), "note.md");
/// ```
pub fn normalize_source_path(path: &Path) -> String {
    let mut s = path.to_string_lossy().to_string();
    if std::path::MAIN_SEPARATOR == '\\' {
        s = s.replace('\\', "/");
    }
    s
}

/// Derive a page title from a vault file: the file stem with `_` turned into spaces.
///
/// ```
/// use std::path::Path;
/// use mdwiki_core::utils::title_from_path;
///
/// assert_eq!(title_from_path(Path::new("notes/My_Page.md")), "My Page");
/// ```
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

/// Turn a title or wiki-link target into a URL-safe slug.
///
/// Rules:
/// - Convert to lowercase
/// - Every run of characters outside `[a-z0-9]` becomes one hyphen
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use mdwiki_core::slugify;
///
/// assert_eq!(slugify("My Page"), "my-page");
/// assert_eq!(slugify("  Hello,   World!  "), "hello-world");
/// assert_eq!(slugify("a__b--c"), "a-b-c");
/// assert_eq!(slugify("!!!"), "");
/// assert_eq!(slugify("Café Notes"), "caf-notes");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Escape text for inclusion in HTML (`& < > " '`).
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Page"), "my-page");
        assert_eq!(slugify("Hello (World)!"), "hello-world");
        assert_eq!(slugify("A  B  C"), "a-b-c"); // Runs collapse
        assert_eq!(slugify("-Hello-"), "hello");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Café Notes"), "caf-notes");
        assert_eq!(slugify("日本"), "");
        assert_eq!(slugify("version 2.0"), "version-2-0");
    }

    #[test]
    fn test_title_from_path() {
        assert_eq!(title_from_path(Path::new("Daily_Log.md")), "Daily Log");
        assert_eq!(title_from_path(Path::new("a/b/c.md")), "c");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }
}
