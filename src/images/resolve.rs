//! Read-time artwork resolution: prefer the local cache, fall back to the
//! provider's CDN, or report that no image exists.

use std::path::{Path, PathBuf};

use homestream_common::{FolderId, ImageKind, MediaId};
use homestream_store::{
    CatalogLayout, CollectionRecord, EpisodeRecord, MovieRecord, SeasonRecord, TvShowRecord,
};

use super::cache::{catalog_image_path, movie_image_path};
use super::fetcher::FetchJob;

/// Where a client should load an image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    Remote(String),
}

/// Joins provider path fragments onto the image CDN root and checks the
/// local cache.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_url: String,
}

impl ImageResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full CDN URL for a fragment such as `/abc123.jpg`.
    pub fn remote_url(&self, fragment: &str) -> String {
        if fragment.starts_with('/') {
            format!("{}{fragment}", self.base_url)
        } else {
            format!("{}/{fragment}", self.base_url)
        }
    }

    /// Local file if cached, else the remote URL, else nothing.
    pub fn resolve(&self, local: &Path, fragment: Option<&str>) -> Option<ImageSource> {
        if local.is_file() {
            return Some(ImageSource::Local(local.to_path_buf()));
        }
        fragment.map(|f| ImageSource::Remote(self.remote_url(f)))
    }

    /// A download job for a fragment whose cache file is still missing.
    pub fn job(&self, fragment: Option<&str>, destination: PathBuf) -> Option<FetchJob> {
        let fragment = fragment?;
        if destination.exists() {
            return None;
        }
        Some(FetchJob::new(self.remote_url(fragment), destination))
    }

    // ---------------------------------------------------------------------
    // Per-record helpers
    // ---------------------------------------------------------------------

    pub fn movie(&self, movie: &MovieRecord, kind: ImageKind) -> Option<ImageSource> {
        let images = &movie.metadata.images;
        let fragment = match kind {
            ImageKind::Backdrop => images.backdrop_path.as_deref(),
            ImageKind::Logo => images.logo_path.as_deref(),
            ImageKind::Poster => images.poster_path.as_deref(),
            ImageKind::Still => None,
        };
        self.resolve(&movie_image_path(&movie.path, kind), fragment)
    }

    pub fn show(
        &self,
        layout: &CatalogLayout,
        folder: FolderId,
        show: &TvShowRecord,
        kind: ImageKind,
    ) -> Option<ImageSource> {
        let images = &show.metadata.images;
        let fragment = match kind {
            ImageKind::Backdrop => images.backdrop_path.as_deref(),
            ImageKind::Logo => images.logo_path.as_deref(),
            ImageKind::Poster => images.poster_path.as_deref(),
            ImageKind::Still => None,
        };
        let dir = layout.item_dir(folder, show.id);
        self.resolve(&catalog_image_path(&dir, kind), fragment)
    }

    pub fn season(
        &self,
        layout: &CatalogLayout,
        folder: FolderId,
        show: MediaId,
        season: &SeasonRecord,
    ) -> Option<ImageSource> {
        let dir = layout.season_dir(folder, show, season.season_number);
        self.resolve(
            &catalog_image_path(&dir, ImageKind::Poster),
            season.metadata.poster_path.as_deref(),
        )
    }

    pub fn episode(
        &self,
        layout: &CatalogLayout,
        folder: FolderId,
        show: MediaId,
        season: u32,
        episode: &EpisodeRecord,
    ) -> Option<ImageSource> {
        let dir = layout.episode_dir(folder, show, season, episode.episode_number);
        self.resolve(
            &catalog_image_path(&dir, ImageKind::Still),
            episode.metadata.still_path.as_deref(),
        )
    }

    pub fn collection(
        &self,
        layout: &CatalogLayout,
        collection: &CollectionRecord,
        kind: ImageKind,
    ) -> Option<ImageSource> {
        let fragment = match kind {
            ImageKind::Backdrop => collection.images.backdrop_path.as_deref(),
            ImageKind::Poster => collection.images.poster_path.as_deref(),
            ImageKind::Logo | ImageKind::Still => None,
        };
        let dir = layout.collection_dir(collection.id);
        self.resolve(&catalog_image_path(&dir, kind), fragment)
    }
}
