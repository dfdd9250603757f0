use ignore::WalkBuilder;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// A regular file discovered by the crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }
}

/// Recursively list every regular file under `root`.
///
/// Nothing is filtered here: hidden files and ignore files are reported like
/// any other entry. Symlinks to regular files count as files; symlinked
/// directories are not descended into. Entries that cannot be read are logged
/// and skipped.
pub fn crawl(root: &Path) -> Vec<FileEntry> {
    if !root.exists() {
        error!(root = %root.display(), "dataset path does not exist");
        return Vec::new();
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let metadata = if entry.path_is_symlink() {
            // Resolve links to files; linked directories are never walked
            fs::metadata(entry.path()).map_err(ignore::Error::from)
        } else if entry.file_type().is_some_and(|t| t.is_file()) {
            entry.metadata()
        } else {
            continue;
        };

        match metadata {
            Ok(meta) if meta.is_file() => files.push(FileEntry {
                size_bytes: meta.len(),
                path: entry.into_path(),
            }),
            Ok(_) => {}
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "error getting size of file");
            }
        }
    }

    files
}

/// Sum of the reported sizes
pub fn total_size(files: &[FileEntry]) -> u64 {
    files.iter().map(|f| f.size_bytes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_crawl_recurses_and_keeps_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("top.txt"), "hello").unwrap();
        fs::write(root.join("a/b/deep.txt"), "0123456789").unwrap();
        fs::write(root.join(".hidden/secret.txt"), "x").unwrap();
        fs::write(root.join(".gitignore"), "*.txt\n").unwrap();

        let mut files = crawl(root);
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from(".gitignore"),
                PathBuf::from(".hidden/secret.txt"),
                PathBuf::from("a/b/deep.txt"),
                PathBuf::from("top.txt"),
            ]
        );
        assert_eq!(total_size(&files), 6 + 1 + 10 + 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_crawl_follows_file_links_only() {
        use std::os::unix::fs::symlink;

        let outside = tempdir().unwrap();
        let real = outside.path().join("real.txt");
        fs::write(&real, "hello world").unwrap();
        fs::create_dir_all(outside.path().join("sub")).unwrap();
        fs::write(outside.path().join("sub/inner.txt"), "abc").unwrap();

        let dir = tempdir().unwrap();
        let link = dir.path().join("link.txt");
        symlink(&real, &link).unwrap();
        symlink(outside.path().join("sub"), dir.path().join("linked_dir")).unwrap();
        symlink(dir.path().join("gone.txt"), dir.path().join("dangling")).unwrap();

        assert_eq!(crawl(dir.path()), vec![FileEntry::new(&link, 11)]);
    }

    #[test]
    fn test_crawl_missing_root() {
        let dir = tempdir().unwrap();
        assert!(crawl(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_crawl_single_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("one.txt");
        fs::write(&file, "abc").unwrap();
        assert_eq!(crawl(&file), vec![FileEntry::new(&file, 3)]);
    }
}
