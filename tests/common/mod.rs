//! Shared test harness for integration tests.
//!
//! Provides [`TestLibrary`], a temporary media tree plus catalog directory,
//! and [`StubProvider`], an in-memory [`MetadataProvider`] with canned
//! answers and call counters.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use homestream::config::Folder;
use homestream::images::{AssetFetcher, ImageResolver};
use homestream::metadata::{MetadataProvider, SearchResult};
use homestream::scanner::LibraryScanner;
use homestream_common::{CollectionId, FolderId, MediaId, MediaKind};
use homestream_store::{
    CatalogStore, CollectionRecord, EpisodeMetadata, MovieMetadata, SeasonMetadata, ShowMetadata,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// A media folder and a catalog directory inside one temp dir.
pub struct TestLibrary {
    _dir: TempDir,
    pub media: PathBuf,
    pub data: PathBuf,
}

impl TestLibrary {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let media = dir.path().join("media");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&media).unwrap();
        std::fs::create_dir_all(&data).unwrap();
        Self {
            _dir: dir,
            media,
            data,
        }
    }

    /// Create a small file under the media root, making parent dirs.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.media.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    pub fn folder(&self, id: u64, kind: MediaKind) -> Folder {
        Folder {
            id: FolderId::from(id),
            name: format!("Folder {id}"),
            path: self.media.clone(),
            media_kind: kind,
        }
    }

    pub fn store(&self) -> CatalogStore {
        CatalogStore::new(&self.data)
    }

    /// A scanner over this library that never downloads artwork.
    pub fn scanner(&self, provider: Arc<StubProvider>) -> LibraryScanner {
        self.scanner_with_images(provider, "http://127.0.0.1:9")
            .with_save_images(false)
    }

    pub fn scanner_with_images(
        &self,
        provider: Arc<StubProvider>,
        image_base: &str,
    ) -> LibraryScanner {
        LibraryScanner::new(
            self.store(),
            provider,
            AssetFetcher::new(5).unwrap(),
            ImageResolver::new(image_base),
        )
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Canned metadata keyed by provider id.
#[derive(Default)]
pub struct StubProvider {
    movies: Vec<(SearchResult, MovieMetadata)>,
    shows: Vec<(SearchResult, ShowMetadata)>,
    seasons: HashMap<(MediaId, u32), SeasonMetadata>,
    episodes: HashMap<(MediaId, u32, u32), EpisodeMetadata>,
    collections: HashMap<CollectionId, CollectionRecord>,
    pub searches: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

fn result(id: u64, title: &str) -> SearchResult {
    SearchResult {
        id: MediaId::from(id),
        title: title.to_string(),
        year: None,
        overview: None,
        poster_path: None,
    }
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movie(mut self, id: u64, title: &str, collection: Option<u64>) -> Self {
        let metadata = MovieMetadata {
            title: title.to_string(),
            collection_id: collection.map(CollectionId::from),
            ..Default::default()
        };
        self.movies.push((result(id, title), metadata));
        self
    }

    pub fn movie_with(mut self, id: u64, metadata: MovieMetadata) -> Self {
        self.movies.push((result(id, &metadata.title), metadata));
        self
    }

    pub fn show(mut self, id: u64, title: &str) -> Self {
        let metadata = ShowMetadata {
            title: title.to_string(),
            ..Default::default()
        };
        self.shows.push((result(id, title), metadata));
        self
    }

    pub fn show_with(mut self, id: u64, metadata: ShowMetadata) -> Self {
        self.shows.push((result(id, &metadata.title), metadata));
        self
    }

    pub fn season(mut self, show: u64, season: u32, name: &str) -> Self {
        self.seasons.insert(
            (MediaId::from(show), season),
            SeasonMetadata {
                id: Some(show * 100 + u64::from(season)),
                name: name.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn episode(mut self, show: u64, season: u32, episode: u32, title: &str) -> Self {
        self.episodes.insert(
            (MediaId::from(show), season, episode),
            EpisodeMetadata {
                id: Some(show * 10_000 + u64::from(season) * 100 + u64::from(episode)),
                title: title.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn collection(mut self, id: u64, name: &str) -> Self {
        self.collections.insert(
            CollectionId::from(id),
            CollectionRecord {
                id: CollectionId::from(id),
                name: name.to_string(),
                overview: None,
                images: Default::default(),
            },
        );
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn detail(&self) {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Loose containment either way, so `"Matrix"` finds `"The Matrix"`.
fn related(query: &str, title: &str) -> bool {
    let query = query.to_lowercase();
    let title = title.to_lowercase();
    title.contains(&query) || query.contains(&title)
}

#[async_trait]
impl MetadataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(&self, kind: MediaKind, title: &str, _year: Option<&str>) -> Vec<SearchResult> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let candidates: Vec<&SearchResult> = match kind {
            MediaKind::Movie => self.movies.iter().map(|(r, _)| r).collect(),
            MediaKind::TvShow => self.shows.iter().map(|(r, _)| r).collect(),
        };
        candidates
            .into_iter()
            .filter(|r| related(title, &r.title))
            .cloned()
            .collect()
    }

    async fn movie_details(&self, id: MediaId) -> Option<MovieMetadata> {
        self.detail();
        self.movies
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(_, m)| m.clone())
    }

    async fn show_details(&self, id: MediaId) -> Option<ShowMetadata> {
        self.detail();
        self.shows
            .iter()
            .find(|(r, _)| r.id == id)
            .map(|(_, m)| m.clone())
    }

    async fn season_details(&self, show: MediaId, season: u32) -> Option<SeasonMetadata> {
        self.detail();
        self.seasons.get(&(show, season)).cloned()
    }

    async fn episode_details(
        &self,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> Option<EpisodeMetadata> {
        self.detail();
        self.episodes.get(&(show, season, episode)).cloned()
    }

    async fn collection_details(&self, id: CollectionId) -> Option<CollectionRecord> {
        self.detail();
        self.collections.get(&id).cloned()
    }
}

/// Path relative to the library's media root, for readable assertions.
pub fn relative<'a>(library: &TestLibrary, path: &'a Path) -> &'a Path {
    path.strip_prefix(&library.media).unwrap_or(path)
}
