//! Trait definition and types for metadata providers.
//!
//! This module defines the [`MetadataProvider`] trait the scanner and watcher
//! talk to, along with the search result type it returns. Detail lookups
//! return the catalog's own metadata structs so a response can be stored
//! without another conversion step.

use async_trait::async_trait;
use homestream_common::{CollectionId, MediaId, MediaKind};
use homestream_parser::Candidate;
use homestream_store::{
    CollectionRecord, EpisodeMetadata, MovieMetadata, SeasonMetadata, ShowMetadata,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single result returned from a metadata search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider-assigned identifier (e.g. TMDB numeric ID).
    pub id: MediaId,
    /// Display title of the movie or show.
    pub title: String,
    /// Release or premiere year, if known.
    pub year: Option<u16>,
    /// Short synopsis.
    pub overview: Option<String>,
    /// Path fragment of the poster image, if available.
    pub poster_path: Option<String>,
}

impl Candidate for SearchResult {
    fn title(&self) -> &str {
        &self.title
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait implemented by remote metadata catalogs.
///
/// Every lookup is infallible from the caller's point of view: transport
/// errors, bad responses and "no such document" all come back as an empty
/// list or `None`. Implementations log failures themselves at `error` level
/// so callers only need to handle the miss.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has credentials and can be queried.
    fn is_available(&self) -> bool;

    /// Search movies or shows by title, in the provider's own ranking order.
    async fn search(&self, kind: MediaKind, title: &str, year: Option<&str>) -> Vec<SearchResult>;

    async fn movie_details(&self, id: MediaId) -> Option<MovieMetadata>;

    async fn show_details(&self, id: MediaId) -> Option<ShowMetadata>;

    async fn season_details(&self, show: MediaId, season: u32) -> Option<SeasonMetadata>;

    async fn episode_details(
        &self,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> Option<EpisodeMetadata>;

    async fn collection_details(&self, id: CollectionId) -> Option<CollectionRecord>;
}
