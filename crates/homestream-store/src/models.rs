//! Catalog record types.
//!
//! Records are addressed by composite keys (folder, id, season, episode) and
//! carry no references to one another. Top-level records carry an explicit
//! `kind` discriminant so readers never need to probe a document's shape.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use homestream_common::{CollectionId, MediaId};
use serde::{Deserialize, Serialize};

/// Provider path fragments for a record's artwork (e.g. `/abc123.jpg`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRefs {
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Descriptive metadata for a movie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Collection the provider places this movie in, if any.
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    #[serde(default)]
    pub images: ImageRefs,
}

/// A catalogued movie, backed by exactly one video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MediaId,
    /// The video file. Set on first import and never reassigned.
    pub path: PathBuf,
    pub metadata: MovieMetadata,
    pub added_at: DateTime<Utc>,
}

/// Descriptive metadata for a TV show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowMetadata {
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: ImageRefs,
}

/// A catalogued TV show. Seasons and episodes live beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvShowRecord {
    pub id: MediaId,
    /// Top-level directory of the show inside its folder.
    #[serde(default)]
    pub root_path: Option<PathBuf>,
    pub metadata: ShowMetadata,
}

/// A record stored at the root of a folder's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogRecord {
    Movie(MovieRecord),
    TvShow(TvShowRecord),
}

impl CatalogRecord {
    pub fn id(&self) -> MediaId {
        match self {
            Self::Movie(movie) => movie.id,
            Self::TvShow(show) => show.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Movie(movie) => &movie.metadata.title,
            Self::TvShow(show) => &show.metadata.title,
        }
    }

    /// The movie's video file or the show's root directory.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Movie(movie) => Some(&movie.path),
            Self::TvShow(show) => show.root_path.as_deref(),
        }
    }

    pub fn as_movie(&self) -> Option<&MovieRecord> {
        match self {
            Self::Movie(movie) => Some(movie),
            Self::TvShow(_) => None,
        }
    }

    pub fn as_show(&self) -> Option<&TvShowRecord> {
        match self {
            Self::TvShow(show) => Some(show),
            Self::Movie(_) => None,
        }
    }
}

impl From<MovieRecord> for CatalogRecord {
    fn from(movie: MovieRecord) -> Self {
        Self::Movie(movie)
    }
}

impl From<TvShowRecord> for CatalogRecord {
    fn from(show: TvShowRecord) -> Self {
        Self::TvShow(show)
    }
}

/// Descriptive metadata for a season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonMetadata {
    /// Provider id of the season document, when known.
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub season_number: u32,
    /// Directory the season's episode files were found in.
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub metadata: SeasonMetadata,
}

/// Descriptive metadata for an episode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub still_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: u32,
    /// The episode's video file.
    pub path: PathBuf,
    pub metadata: EpisodeMetadata,
}

/// Artwork fragments for a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionImages {
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// A provider collection grouping two or more catalogued movies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub images: CollectionImages,
}

/// A record together with the catalog directory it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord<T> {
    pub path: PathBuf,
    pub record: T,
}

/// Position of an episode inside a folder's catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeLocation {
    pub show_id: MediaId,
    pub season_number: u32,
    pub episode: EpisodeRecord,
}
