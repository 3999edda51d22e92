//! Directory layout of the catalog.

use std::path::{Path, PathBuf};

use homestream_common::{CollectionId, FolderId, MediaId};

/// Name of the document file inside every record directory.
pub const DOCUMENT_NAME: &str = "metadata.yml";

const LIBRARIES_DIR: &str = "libraries";
const COLLECTIONS_DIR: &str = "collections";
const SUBTITLES_DIR: &str = "subtitles";

/// Maps composite record keys to directories below a data root.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    root: PathBuf,
}

impl CatalogLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_dir(&self, folder: FolderId) -> PathBuf {
        self.root.join(LIBRARIES_DIR).join(folder.to_string())
    }

    pub fn item_dir(&self, folder: FolderId, id: MediaId) -> PathBuf {
        self.folder_dir(folder).join(id.to_string())
    }

    /// `<item>/<season>` with the season zero-padded to two digits.
    pub fn season_dir(&self, folder: FolderId, show: MediaId, season: u32) -> PathBuf {
        self.item_dir(folder, show).join(format!("{season:02}"))
    }

    pub fn episode_dir(
        &self,
        folder: FolderId,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> PathBuf {
        self.season_dir(folder, show, season)
            .join(format!("{episode:02}"))
    }

    pub fn collections_root(&self) -> PathBuf {
        self.root.join(COLLECTIONS_DIR)
    }

    pub fn collection_dir(&self, id: CollectionId) -> PathBuf {
        self.collections_root().join(id.to_string())
    }

    /// Directory holding extracted subtitle files, named `<item-id>_*`.
    pub fn subtitles_dir(&self) -> PathBuf {
        self.root.join(SUBTITLES_DIR)
    }
}

/// Path of the document inside a record directory.
pub fn document_path(dir: &Path) -> PathBuf {
    dir.join(DOCUMENT_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_directories_are_zero_padded() {
        let layout = CatalogLayout::new("/data");
        let folder = FolderId::from(1);
        let show = MediaId::from(1396);

        assert_eq!(
            layout.item_dir(folder, show),
            PathBuf::from("/data/libraries/1/1396")
        );
        assert_eq!(
            layout.season_dir(folder, show, 2),
            PathBuf::from("/data/libraries/1/1396/02")
        );
        assert_eq!(
            layout.episode_dir(folder, show, 2, 13),
            PathBuf::from("/data/libraries/1/1396/02/13")
        );
    }

    #[test]
    fn collections_are_shared_across_folders() {
        let layout = CatalogLayout::new("/data");
        assert_eq!(
            layout.collection_dir(CollectionId::from(10)),
            PathBuf::from("/data/collections/10")
        );
        assert_eq!(
            document_path(&layout.collection_dir(CollectionId::from(10))),
            PathBuf::from("/data/collections/10/metadata.yml")
        );
    }
}
