//! Cached subtitle artifacts.
//!
//! Extracted or converted subtitle files are kept under
//! `<data_dir>/subtitles` and named `<item id>_<anything>`. When an item
//! leaves the catalog its files are purged.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use homestream_common::MediaId;
use tracing::{debug, warn};

/// Removes cached subtitle files for catalog items.
pub trait SubtitleCache: Send + Sync {
    /// Delete every artifact belonging to `id`, returning how many went.
    fn purge(&self, id: MediaId) -> Result<usize>;
}

/// [`SubtitleCache`] over a flat directory of `<id>_*` files.
#[derive(Debug, Clone)]
pub struct SubtitleDirectory {
    dir: PathBuf,
}

impl SubtitleDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SubtitleCache for SubtitleDirectory {
    fn purge(&self, id: MediaId) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read subtitle directory {:?}", self.dir))
            }
        };

        let prefix = format!("{id}_");
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(&prefix) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = ?entry.path(), error = %e, "Failed to remove subtitle"),
            }
        }

        debug!(id = %id, removed, "Purged subtitles");
        Ok(removed)
    }
}
