//! Read/write operations on the catalog.
//!
//! Reads are forgiving: a missing directory, a missing document or a
//! document that no longer parses all resolve to "not catalogued" so a scan
//! can recreate the record. Writes replace the whole document atomically
//! (temp file in the same directory, then rename).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use homestream_common::{CollectionId, Error, FolderId, MediaId, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::{document_path, CatalogLayout};
use crate::models::{
    CatalogRecord, CollectionRecord, EpisodeLocation, EpisodeRecord, SeasonRecord, StoredRecord,
};

/// Content-addressable catalog of one data directory.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    layout: CatalogLayout,
}

impl CatalogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: CatalogLayout::new(data_dir),
        }
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    // ---------------------------------------------------------------------
    // Top-level records
    // ---------------------------------------------------------------------

    /// Fetch a movie or show by provider id.
    pub fn get(&self, folder: FolderId, id: MediaId) -> Option<CatalogRecord> {
        read_document(&self.layout.item_dir(folder, id))
    }

    /// Write (or fully replace) a movie or show.
    pub fn put(&self, folder: FolderId, record: &CatalogRecord) -> Result<()> {
        write_document(&self.layout.item_dir(folder, record.id()), record)
    }

    pub fn contains(&self, folder: FolderId, id: MediaId) -> bool {
        self.get(folder, id).is_some()
    }

    /// Delete a record and everything nested under it.
    ///
    /// Returns `false` when nothing was stored under that id.
    pub fn remove(&self, folder: FolderId, id: MediaId) -> Result<bool> {
        remove_dir(&self.layout.item_dir(folder, id))
    }

    /// Every readable top-level record of a folder, ordered by id.
    pub fn list(&self, folder: FolderId) -> Vec<StoredRecord<CatalogRecord>> {
        let mut records: Vec<StoredRecord<CatalogRecord>> =
            list_documents(&self.layout.folder_dir(folder));
        records.sort_by_key(|entry| entry.record.id());
        records
    }

    /// The record whose own path equals `path` (a movie's video file or a
    /// show's root directory).
    pub fn find_by_path(
        &self,
        folder: FolderId,
        path: &Path,
    ) -> Option<StoredRecord<CatalogRecord>> {
        self.list(folder)
            .into_iter()
            .find(|entry| entry.record.path() == Some(path))
    }

    // ---------------------------------------------------------------------
    // Seasons
    // ---------------------------------------------------------------------

    pub fn get_season(&self, folder: FolderId, show: MediaId, season: u32) -> Option<SeasonRecord> {
        read_document(&self.layout.season_dir(folder, show, season))
    }

    /// Write a season below an existing show.
    pub fn put_season(&self, folder: FolderId, show: MediaId, season: &SeasonRecord) -> Result<()> {
        self.require_item(folder, show)?;
        write_document(
            &self.layout.season_dir(folder, show, season.season_number),
            season,
        )
    }

    pub fn list_seasons(&self, folder: FolderId, show: MediaId) -> Vec<StoredRecord<SeasonRecord>> {
        let mut seasons: Vec<StoredRecord<SeasonRecord>> =
            list_documents(&self.layout.item_dir(folder, show));
        seasons.sort_by_key(|entry| entry.record.season_number);
        seasons
    }

    // ---------------------------------------------------------------------
    // Episodes
    // ---------------------------------------------------------------------

    pub fn get_episode(
        &self,
        folder: FolderId,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> Option<EpisodeRecord> {
        read_document(&self.layout.episode_dir(folder, show, season, episode))
    }

    /// Append or replace an episode, keyed by its episode number.
    ///
    /// The show must already be catalogued.
    pub fn put_episode(
        &self,
        folder: FolderId,
        show: MediaId,
        season: u32,
        episode: &EpisodeRecord,
    ) -> Result<()> {
        self.require_item(folder, show)?;
        write_document(
            &self
                .layout
                .episode_dir(folder, show, season, episode.episode_number),
            episode,
        )
    }

    pub fn list_episodes(
        &self,
        folder: FolderId,
        show: MediaId,
        season: u32,
    ) -> Vec<StoredRecord<EpisodeRecord>> {
        let mut episodes: Vec<StoredRecord<EpisodeRecord>> =
            list_documents(&self.layout.season_dir(folder, show, season));
        episodes.sort_by_key(|entry| entry.record.episode_number);
        episodes
    }

    /// Remove one episode from its season. Show and season stay in place.
    pub fn remove_episode(
        &self,
        folder: FolderId,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> Result<bool> {
        remove_dir(&self.layout.episode_dir(folder, show, season, episode))
    }

    /// Locate the episode backed by `path` across every show of a folder.
    pub fn find_episode_by_path(&self, folder: FolderId, path: &Path) -> Option<EpisodeLocation> {
        for show in self.list(folder) {
            let Some(show_record) = show.record.as_show() else {
                continue;
            };
            for season in self.list_seasons(folder, show_record.id) {
                let season_number = season.record.season_number;
                if let Some(episode) = self
                    .list_episodes(folder, show_record.id, season_number)
                    .into_iter()
                    .find(|entry| entry.record.path == path)
                {
                    return Some(EpisodeLocation {
                        show_id: show_record.id,
                        season_number,
                        episode: episode.record,
                    });
                }
            }
        }
        None
    }

    // ---------------------------------------------------------------------
    // Collections
    // ---------------------------------------------------------------------

    pub fn get_collection(&self, id: CollectionId) -> Option<CollectionRecord> {
        read_document(&self.layout.collection_dir(id))
    }

    pub fn put_collection(&self, collection: &CollectionRecord) -> Result<()> {
        write_document(&self.layout.collection_dir(collection.id), collection)
    }

    pub fn list_collections(&self) -> Vec<StoredRecord<CollectionRecord>> {
        let mut collections: Vec<StoredRecord<CollectionRecord>> =
            list_documents(&self.layout.collections_root());
        collections.sort_by_key(|entry| entry.record.id);
        collections
    }

    fn require_item(&self, folder: FolderId, id: MediaId) -> Result<()> {
        if self.contains(folder, id) {
            Ok(())
        } else {
            Err(Error::not_found(format!("show {id} in folder {folder}")))
        }
    }
}

// ---------------------------------------------------------------------------
// Document I/O
// ---------------------------------------------------------------------------

fn read_document<T: DeserializeOwned>(dir: &Path) -> Option<T> {
    let path = document_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = ?path, error = %e, "Failed to read catalog document");
            }
            return None;
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = ?path, error = %e, "Ignoring unparsable catalog document");
            None
        }
    }
}

fn write_document<T: Serialize>(dir: &Path, record: &T) -> Result<()> {
    fs::create_dir_all(dir)?;
    let yaml = serde_yaml::to_string(record)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(yaml.as_bytes())?;
    tmp.flush()?;
    tmp.persist(document_path(dir)).map_err(|e| e.error)?;

    debug!(dir = ?dir, "Wrote catalog document");
    Ok(())
}

fn list_documents<T: DeserializeOwned>(dir: &Path) -> Vec<StoredRecord<T>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = ?dir, error = %e, "Failed to list catalog directory");
            }
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            read_document(&path).map(|record| StoredRecord { path, record })
        })
        .collect()
}

fn remove_dir(dir: &Path) -> Result<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use chrono::{TimeZone, Utc};

    fn folder() -> FolderId {
        FolderId::from(1)
    }

    fn movie(id: u64, path: &str, collection: Option<u64>) -> CatalogRecord {
        CatalogRecord::Movie(MovieRecord {
            id: MediaId::from(id),
            path: PathBuf::from(path),
            metadata: MovieMetadata {
                title: format!("Movie {id}"),
                original_title: None,
                overview: Some("overview".into()),
                release_date: Some("2014-11-05".into()),
                runtime: Some(169),
                genres: vec!["Drama".into(), "Science Fiction".into()],
                collection_id: collection.map(CollectionId::from),
                images: ImageRefs {
                    backdrop_path: Some("/backdrop.jpg".into()),
                    logo_path: None,
                    poster_path: Some("/poster.jpg".into()),
                },
            },
            added_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        })
    }

    fn show(id: u64, title: &str) -> CatalogRecord {
        CatalogRecord::TvShow(TvShowRecord {
            id: MediaId::from(id),
            root_path: Some(PathBuf::from(format!("/tv/{title}"))),
            metadata: ShowMetadata {
                title: title.into(),
                ..Default::default()
            },
        })
    }

    fn episode(number: u32, path: &str) -> EpisodeRecord {
        EpisodeRecord {
            episode_number: number,
            path: PathBuf::from(path),
            metadata: EpisodeMetadata {
                title: format!("Episode {number}"),
                ..Default::default()
            },
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let record = movie(157336, "/movies/Interstellar 2014.mkv", Some(10));

        store.put(folder(), &record).unwrap();
        assert_eq!(store.get(folder(), MediaId::from(157336)), Some(record));
        assert!(dir
            .path()
            .join("libraries/1/157336/metadata.yml")
            .is_file());
    }

    #[test]
    fn document_carries_kind_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.put(folder(), &show(1396, "Breaking Bad")).unwrap();

        let raw = fs::read_to_string(dir.path().join("libraries/1/1396/metadata.yml")).unwrap();
        assert!(raw.contains("kind: tv_show"));
    }

    #[test]
    fn missing_and_corrupt_documents_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        assert!(store.get(folder(), MediaId::from(1)).is_none());

        let item = dir.path().join("libraries/1/2");
        fs::create_dir_all(&item).unwrap();
        fs::write(item.join("metadata.yml"), "kind: [not valid").unwrap();
        assert!(store.get(folder(), MediaId::from(2)).is_none());
        assert!(store.list(folder()).is_empty());
    }

    #[test]
    fn list_skips_unreadable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.put(folder(), &movie(20, "/m/b.mkv", None)).unwrap();
        store.put(folder(), &movie(10, "/m/a.mkv", None)).unwrap();
        fs::create_dir_all(dir.path().join("libraries/1/empty")).unwrap();
        fs::write(dir.path().join("libraries/1/stray.txt"), "x").unwrap();

        let ids: Vec<u64> = store
            .list(folder())
            .iter()
            .map(|entry| entry.record.id().get())
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn put_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.put(folder(), &movie(5, "/m/a.mkv", Some(10))).unwrap();
        store.put(folder(), &movie(5, "/m/a.mkv", None)).unwrap();

        let stored = store.get(folder(), MediaId::from(5)).unwrap();
        assert_eq!(stored.as_movie().unwrap().metadata.collection_id, None);
    }

    #[test]
    fn find_by_path_matches_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.put(folder(), &movie(5, "/m/a.mkv", None)).unwrap();

        let found = store.find_by_path(folder(), Path::new("/m/a.mkv")).unwrap();
        assert_eq!(found.record.id(), MediaId::from(5));
        assert!(store.find_by_path(folder(), Path::new("/m/b.mkv")).is_none());
    }

    #[test]
    fn episodes_require_show() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let err = store
            .put_episode(folder(), MediaId::from(1396), 1, &episode(1, "/tv/a.mkv"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn seasons_and_episodes_nest_under_show() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let show_id = MediaId::from(1396);
        store.put(folder(), &show(1396, "Breaking Bad")).unwrap();

        let season = SeasonRecord {
            season_number: 1,
            path: Some(PathBuf::from("/tv/Breaking Bad/Season 1")),
            metadata: SeasonMetadata {
                name: "Season 1".into(),
                ..Default::default()
            },
        };
        store.put_season(folder(), show_id, &season).unwrap();
        store
            .put_episode(folder(), show_id, 1, &episode(5, "/tv/bb/S01E05.mkv"))
            .unwrap();
        store
            .put_episode(folder(), show_id, 1, &episode(2, "/tv/bb/S01E02.mkv"))
            .unwrap();

        assert!(dir.path().join("libraries/1/1396/01/05/metadata.yml").is_file());
        assert_eq!(store.get_season(folder(), show_id, 1), Some(season));

        let numbers: Vec<u32> = store
            .list_episodes(folder(), show_id, 1)
            .iter()
            .map(|entry| entry.record.episode_number)
            .collect();
        assert_eq!(numbers, vec![2, 5]);

        // Seasons never appear as top-level records.
        assert_eq!(store.list(folder()).len(), 1);
        assert_eq!(store.list_seasons(folder(), show_id).len(), 1);
    }

    #[test]
    fn remove_episode_keeps_season() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let show_id = MediaId::from(1396);
        store.put(folder(), &show(1396, "Breaking Bad")).unwrap();
        store
            .put_season(
                folder(),
                show_id,
                &SeasonRecord {
                    season_number: 1,
                    path: None,
                    metadata: SeasonMetadata::default(),
                },
            )
            .unwrap();
        store
            .put_episode(folder(), show_id, 1, &episode(5, "/tv/bb/S01E05.mkv"))
            .unwrap();

        let location = store
            .find_episode_by_path(folder(), Path::new("/tv/bb/S01E05.mkv"))
            .unwrap();
        assert_eq!(location.show_id, show_id);
        assert_eq!(location.season_number, 1);

        assert!(store.remove_episode(folder(), show_id, 1, 5).unwrap());
        assert!(!store.remove_episode(folder(), show_id, 1, 5).unwrap());
        assert!(store.get_episode(folder(), show_id, 1, 5).is_none());
        assert!(store.get_season(folder(), show_id, 1).is_some());
    }

    #[test]
    fn remove_movie() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.put(folder(), &movie(5, "/m/a.mkv", None)).unwrap();

        assert!(store.remove(folder(), MediaId::from(5)).unwrap());
        assert!(store.get(folder(), MediaId::from(5)).is_none());
        assert!(!store.remove(folder(), MediaId::from(5)).unwrap());
    }

    #[test]
    fn collections_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let collection = CollectionRecord {
            id: CollectionId::from(10),
            name: "The Dark Knight Collection".into(),
            overview: None,
            images: CollectionImages {
                backdrop_path: Some("/b.jpg".into()),
                poster_path: None,
            },
        };

        store.put_collection(&collection).unwrap();
        assert_eq!(store.get_collection(CollectionId::from(10)), Some(collection));
        assert_eq!(store.list_collections().len(), 1);
        assert!(store.get_collection(CollectionId::from(99)).is_none());
    }
}
