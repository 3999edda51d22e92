//! Filename heuristics and fuzzy title matching.
//!
//! Two small, pure building blocks used by the library scanner:
//!
//! - [`filename`] turns a file or directory name into a title, an optional
//!   year and, for episodes, season and episode numbers.
//! - [`matcher`] picks the provider candidate whose title is closest to a
//!   parsed title by Levenshtein distance.
//!
//! Neither module performs I/O and neither can fail. A name that does not
//! fit a pattern simply yields `None`.
//!
//! # Examples
//!
//! ```
//! use homestream_parser::{best_match, parse_episode_filename, parse_movie_filename, Candidate};
//!
//! let movie = parse_movie_filename("Interstellar 2014.mkv");
//! assert_eq!(movie.title, "Interstellar");
//! assert_eq!(movie.year.as_deref(), Some("2014"));
//!
//! let episode = parse_episode_filename("Breaking Bad S01E05.mkv").unwrap();
//! assert_eq!(episode.title, "Breaking Bad");
//! assert_eq!(episode.season_number(), 1);
//!
//! struct Hit(&'static str);
//! impl Candidate for Hit {
//!     fn title(&self) -> &str {
//!         self.0
//!     }
//! }
//!
//! let hits = [Hit("The Matrix Reloaded"), Hit("The Matrix")];
//! assert_eq!(best_match("The Matrix", &hits).map(|h| h.0), Some("The Matrix"));
//! ```

pub mod filename;
pub mod matcher;

pub use filename::{
    parse_episode_filename, parse_episode_number, parse_movie_filename, parse_season_directory,
    ParsedEpisode, ParsedMovie,
};
pub use matcher::{best_match, best_match_with_distance, Candidate};
