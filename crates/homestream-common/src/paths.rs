//! Path utilities for detecting video files by extension.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use homestream_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.mp4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check a path against a caller-supplied extension list.
///
/// An empty list falls back to the built-in video extensions.
pub fn has_media_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return is_video_file(path);
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn has_extension(path: &Path, list: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| list.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
