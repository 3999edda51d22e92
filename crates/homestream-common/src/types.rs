//! Core type definitions for library folders and artwork.
//!
//! All enums are serialized in snake_case, matching the values used in
//! configuration files and catalog documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a library folder holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Standalone films.
    Movie,
    /// Series with seasons and episodes.
    TvShow,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::TvShow => write!(f, "tv_show"),
        }
    }
}

/// Kind of artwork attached to a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Wide background art.
    Backdrop,
    /// Transparent title logo.
    Logo,
    /// Portrait cover art.
    Poster,
    /// Frame grab of an episode.
    Still,
}

impl ImageKind {
    /// File extension used when the image is cached on disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Logo => "png",
            _ => "jpg",
        }
    }

    /// Cache file name used inside a catalog directory (e.g. `poster.jpg`).
    pub fn file_name(self) -> String {
        format!("{self}.{}", self.extension())
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backdrop => write!(f, "backdrop"),
            Self::Logo => write!(f, "logo"),
            Self::Poster => write!(f, "poster"),
            Self::Still => write!(f, "still"),
        }
    }
}
