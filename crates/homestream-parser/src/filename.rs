//! Filename heuristics for movies and episodes.
//!
//! Movies follow `TITLE [YEAR].ext`, episodes follow the canonical
//! `TITLE [(YEAR)] S##E##.ext` form. Season and episode numbers keep their
//! textual, zero-padded form so they round-trip into catalog paths unchanged.

use std::sync::LazyLock;

use regex::Regex;

static MOVIE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(?:\s+(\d{4}))?$").expect("movie filename regex should compile")
});

static EPISODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*(?:\((\d{4})\))?\s*S(\d{2})\s*E(\d{2})$")
        .expect("episode filename regex should compile")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run regex should compile"));

/// Title and optional year recovered from a movie filename.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedMovie {
    pub title: String,
    pub year: Option<String>,
}

/// Show title, optional year and episode coordinates from an episode filename.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedEpisode {
    pub title: String,
    pub year: Option<String>,
    /// Two-digit season, e.g. `"01"`.
    pub season: String,
    /// Two-digit episode, e.g. `"05"`.
    pub episode: String,
}

impl ParsedEpisode {
    /// Season as a number.
    pub fn season_number(&self) -> u32 {
        self.season.parse().unwrap_or_default()
    }

    /// Episode as a number.
    pub fn episode_number(&self) -> u32 {
        self.episode.parse().unwrap_or_default()
    }
}

/// Parse a movie filename into a title and an optional year.
///
/// Everything from the first `.` onwards is discarded. A trailing,
/// whitespace-separated four-digit token becomes the year unless it is the
/// whole name, so `2012.mkv` is the film "2012" with no year.
///
/// ```
/// use homestream_parser::parse_movie_filename;
///
/// let parsed = parse_movie_filename("Interstellar 2014.mkv");
/// assert_eq!(parsed.title, "Interstellar");
/// assert_eq!(parsed.year.as_deref(), Some("2014"));
///
/// assert_eq!(parse_movie_filename("Interstellar").year, None);
/// ```
pub fn parse_movie_filename(name: &str) -> ParsedMovie {
    let base = name.split('.').next().unwrap_or_default().trim();

    match MOVIE_PATTERN.captures(base) {
        Some(caps) => ParsedMovie {
            title: caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            year: caps.get(2).map(|m| m.as_str().to_string()),
        },
        None => ParsedMovie {
            title: base.to_string(),
            year: None,
        },
    }
}

/// Parse a canonical episode filename (`Show [(YEAR)] S01E05.mkv`).
///
/// Returns `None` when the stem does not end in an `S##E##` marker.
pub fn parse_episode_filename(name: &str) -> Option<ParsedEpisode> {
    let stem = strip_last_extension(name).trim();
    let caps = EPISODE_PATTERN.captures(stem)?;

    Some(ParsedEpisode {
        title: caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        year: caps.get(2).map(|m| m.as_str().to_string()),
        season: caps.get(3)?.as_str().to_string(),
        episode: caps.get(4)?.as_str().to_string(),
    })
}

/// Loose episode number heuristic for files inside a known season folder.
///
/// Takes the last whitespace-separated word of the stem, drops a leading
/// `E`/`e`, and accepts it only if what remains is all digits
/// (`"Pilot E01.mkv"` and `"Episode 7.mkv"` both qualify).
pub fn parse_episode_number(name: &str) -> Option<u32> {
    let stem = strip_last_extension(name);
    let word = stem.split_whitespace().last()?;
    let digits = word.strip_prefix(['E', 'e']).unwrap_or(word);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Season number from a directory name: the first run of digits
/// (`"Season 02"` is season 2, `"Specials"` has none).
pub fn parse_season_directory(name: &str) -> Option<u32> {
    DIGITS.find(name)?.as_str().parse().ok()
}

fn strip_last_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
