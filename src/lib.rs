//! Homestream - media library indexing engine
//!
//! Walks configured movie and TV folders, identifies files against TMDB,
//! records the results in a YAML catalog and keeps it in sync with the
//! filesystem.

pub mod config;
pub mod images;
pub mod locks;
pub mod metadata;
pub mod scanner;
pub mod subtitles;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use homestream_store::CatalogStore;

use crate::config::Config;
use crate::images::{AssetFetcher, ImageResolver};
use crate::metadata::{MetadataProvider, TmdbProvider};
use crate::scanner::LibraryScanner;
use crate::subtitles::SubtitleDirectory;
use crate::watch::SyncWatcher;

/// Build the TMDB client described by `config`.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn MetadataProvider>> {
    let api_key = config.provider.resolved_api_key().unwrap_or_default();
    let language = config.provider.language.clone();
    let provider = match &config.provider.api_base_url {
        Some(base_url) => TmdbProvider::with_base_url(api_key, language, base_url.clone())?,
        None => TmdbProvider::new(api_key, language)?,
    };
    Ok(Arc::new(provider))
}

/// Build a scanner over the catalog in `config.data_dir`.
pub fn scanner_from_config(config: &Config) -> Result<LibraryScanner> {
    let scanner = LibraryScanner::new(
        CatalogStore::new(&config.data_dir),
        provider_from_config(config)?,
        AssetFetcher::new(config.scan.image_concurrency)?,
        ImageResolver::new(config.provider.image_base_url.clone()),
    )
    .with_save_images(config.scan.save_images)
    .with_extensions(config.watch.extensions.clone());
    Ok(scanner)
}

/// Build a watcher over every configured folder, sharing `scanner`'s locks.
pub fn watcher_from_config(config: &Config, scanner: Arc<LibraryScanner>) -> SyncWatcher {
    let subtitles = SubtitleDirectory::new(scanner.store().layout().subtitles_dir());
    SyncWatcher::new(scanner, config.folders.clone(), Arc::new(subtitles))
}
