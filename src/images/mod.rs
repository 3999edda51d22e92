//! Artwork caching.
//!
//! [`AssetFetcher`] downloads provider artwork with bounded concurrency,
//! [`cache`] decides where each image lives on disk and [`ImageResolver`]
//! answers "where should this image be loaded from" at read time.

pub mod cache;
mod fetcher;
mod resolve;

pub use fetcher::{run_bounded, AssetFetcher, FetchJob, FetchSummary, DEFAULT_CONCURRENCY};
pub use resolve::{ImageResolver, ImageSource};
