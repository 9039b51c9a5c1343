use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
    pub mtime: SystemTime,
    pub len: u64,
}

/// Abstract interface for file system operations.
pub trait FileSystem: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;

    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    fn metadata(&self, path: &Path) -> std::io::Result<FileMetadata>;

    /// List all files with the given extension under the root directory.
    /// This is a recursive search that skips hidden files and directories
    /// (names starting with `.`). Results are ordered by path.
    fn list_files(&self, root: &Path, extension: &str) -> Vec<PathBuf>;
}

fn is_hidden(entry: &DirEntry) -> bool {
    // The root itself is never filtered, even when it is a dot-directory.
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Standard implementation of FileSystem using std::fs and walkdir.
pub struct PhysicalFileSystem;

impl FileSystem for PhysicalFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn metadata(&self, path: &Path) -> std::io::Result<FileMetadata> {
        let meta = std::fs::metadata(path)?;
        Ok(FileMetadata {
            mtime: meta.modified()?,
            len: meta.len(),
        })
    }

    fn list_files(&self, root: &Path, extension: &str) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable vault entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_file() {
                if let Some(ext) = path.extension() {
                    if ext == extension {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_skips_hidden_and_other_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("sub/b.md"), "b").unwrap();
        fs::write(root.join("sub/deeper/c.md"), "c").unwrap();
        fs::write(root.join("sub/.hidden.md"), "h").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "w").unwrap();
        fs::write(root.join("notes.txt"), "t").unwrap();
        fs::write(root.join("upper.MD"), "u").unwrap();

        let files = PhysicalFileSystem.list_files(root, "md");
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("sub/b.md"),
                PathBuf::from("sub/deeper/c.md"),
            ]
        );
    }

    #[test]
    fn test_metadata_reports_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("note.md");
        fs::write(&path, "hello").unwrap();

        let meta = PhysicalFileSystem.metadata(&path).unwrap();
        assert_eq!(meta.len, 5);
        assert!(meta.mtime <= SystemTime::now());
    }
}
