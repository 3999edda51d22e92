//! Where cached artwork lives on disk.
//!
//! Movie artwork sits beside the movie's own video file
//! (`Interstellar 2014-poster.jpg`); everything else lives in the record's
//! catalog directory (`poster.jpg`, `still.jpg`, ...).

use std::path::{Path, PathBuf};

use homestream_common::ImageKind;

/// `<dir>/<video stem>-<kind>.<ext>`
pub fn movie_image_path(video: &Path, kind: ImageKind) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    video.with_file_name(format!("{stem}-{kind}.{}", kind.extension()))
}

/// `<catalog dir>/<kind>.<ext>`
pub fn catalog_image_path(dir: &Path, kind: ImageKind) -> PathBuf {
    dir.join(kind.file_name())
}
