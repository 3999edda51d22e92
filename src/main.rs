mod cli;

use homestream::{config, scanner_from_config, watch, watcher_from_config};
use homestream_common::FolderId;
use homestream_store::{CatalogRecord, CatalogStore};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::Duration;

async fn scan(config_path: Option<&std::path::Path>, folder: Option<FolderId>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let folders = match folder {
        Some(id) => vec![config
            .folder(id)
            .cloned()
            .with_context(|| format!("No folder with id {id} is configured"))?],
        None => config.folders.clone(),
    };
    if folders.is_empty() {
        tracing::warn!("No folders configured");
        return Ok(());
    }

    let scanner = scanner_from_config(&config)?;
    for (id, report) in scanner.scan_all(&folders).await {
        println!(
            "Folder {}: {} found, {} added, {} skipped, {} unmatched, {} failed, {} images, {} collections",
            id,
            report.files_found,
            report.added,
            report.skipped,
            report.unmatched,
            report.failed,
            report.images_fetched,
            report.collections_created
        );
    }

    Ok(())
}

async fn run_watch(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if config.folders.is_empty() {
        anyhow::bail!("No folders configured to watch");
    }
    if !config.watch.enabled {
        tracing::info!("watch.enabled is off in config; watching anyway for this run");
    }

    let scanner = Arc::new(scanner_from_config(&config)?);

    // Events arriving mid-scan wait on the folder lock.
    let handle = watcher_from_config(&config, scanner.clone()).spawn();
    let paths: Vec<_> = config.folders.iter().map(|f| f.path.clone()).collect();
    let source = watch::FsEventSource::start(
        &paths,
        Duration::from_secs(config.watch.settle_time_secs),
        handle.sender(),
    )?;

    tracing::info!("Starting initial scan");
    scanner.scan_all(&config.folders).await;

    tracing::info!("Watching {} folders, press Ctrl-C to stop", paths.len());
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down...");
    drop(source);
    handle.shutdown().await
}

fn list_folder(config_path: Option<&std::path::Path>, folder: FolderId) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = CatalogStore::new(&config.data_dir);

    for entry in store.list(folder) {
        match &entry.record {
            CatalogRecord::Movie(movie) => {
                println!(
                    "{:>8}  movie    {}  {:?}",
                    movie.id, movie.metadata.title, movie.path
                );
            }
            CatalogRecord::TvShow(show) => {
                let seasons = store.list_seasons(folder, show.id);
                let episodes: usize = seasons
                    .iter()
                    .map(|s| store.list_episodes(folder, show.id, s.record.season_number).len())
                    .sum();
                println!(
                    "{:>8}  tv_show  {}  ({} seasons, {} episodes)",
                    show.id,
                    show.metadata.title,
                    seasons.len(),
                    episodes
                );
            }
        }
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Data dir: {:?}", config.data_dir);
            println!("  Folders: {}", config.folders.len());
            for folder in &config.folders {
                println!(
                    "    {} {} ({}) {:?}",
                    folder.id, folder.name, folder.media_kind, folder.path
                );
            }
            println!("  Language: {}", config.provider.language);
            let api_key = match config.provider.resolved_api_key() {
                Some(_) => "set",
                None => "missing",
            };
            println!("  API key: {}", api_key);
            println!("  Save images: {}", config.scan.save_images);
            println!("  Watch enabled: {}", config.watch.enabled);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Data dir: {:?}", config.data_dir);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "homestream=trace,homestream_store=trace,homestream_parser=debug,reqwest=debug".to_string()
        } else {
            "homestream=debug,homestream_store=info,reqwest=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan { folder } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(cli.config.as_deref(), folder))
        }
        Commands::Watch => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_watch(cli.config.as_deref()))
        }
        Commands::List { folder } => list_folder(cli.config.as_deref(), folder),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("homestream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
