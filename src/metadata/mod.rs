//! Metadata providers for enriching catalog records with external data.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and shared data types.
//! - [`providers`] -- Concrete provider implementations (TMDB).

pub mod provider;
pub mod providers;

pub use provider::{MetadataProvider, SearchResult};
pub use providers::TmdbProvider;
