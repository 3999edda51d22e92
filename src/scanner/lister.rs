//! Directory listing seam for the scanner.
//!
//! The scanner walks with an explicit stack and asks a [`DirectoryLister`]
//! for one directory level at a time, so tests can feed it a synthetic tree
//! and deep libraries never grow the call stack.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;
use walkdir::WalkDir;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// Creation time, or modification time where the platform has none.
    pub created: Option<SystemTime>,
}

impl DirEntry {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Lists the immediate children of a directory.
pub trait DirectoryLister: Send + Sync {
    fn list(&self, dir: &Path) -> std::io::Result<Vec<DirEntry>>;
}

/// [`DirectoryLister`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, dir: &Path) -> std::io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    debug!(dir = ?dir, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            let created = if is_dir {
                None
            } else {
                entry.metadata().ok().and_then(|m| created_time(&m))
            };
            entries.push(DirEntry {
                path: entry.into_path(),
                is_dir,
                created,
            });
        }

        Ok(entries)
    }
}

/// Creation time of a single file, falling back to its modification time.
pub fn file_created(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| created_time(&m))
}

fn created_time(meta: &std::fs::Metadata) -> Option<SystemTime> {
    meta.created().or_else(|_| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_one_level_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b-dir")).unwrap();
        std::fs::create_dir(dir.path().join("b-dir/nested")).unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"x").unwrap();

        let entries = FsLister.list(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name(), "a.mkv");
        assert!(!entries[0].is_dir);
        assert!(entries[0].created.is_some());
        assert_eq!(entries[1].file_name(), "b-dir");
        assert!(entries[1].is_dir);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsLister.list(&dir.path().join("gone")).is_err());
    }
}
