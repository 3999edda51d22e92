//! Provider backends. TMDB is the only catalog homestream talks to today.

pub mod tmdb;

pub use tmdb::TmdbProvider;
