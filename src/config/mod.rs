mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    config.data_dir = expand(&config.data_dir);
    for folder in &mut config.folders {
        folder.path = expand(&folder.path);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./homestream.toml",
        "~/.config/homestream/config.toml",
        "/etc/homestream/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand(path: &Path) -> std::path::PathBuf {
    let raw = path.to_string_lossy();
    std::path::PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();
    for folder in &config.folders {
        if !seen.insert(folder.id) {
            anyhow::bail!("Folder id {} is configured more than once", folder.id);
        }
        if !folder.path.exists() {
            tracing::warn!(folder = %folder.id, "Folder path does not exist: {:?}", folder.path);
        }
    }

    if config.scan.image_concurrency == 0 {
        anyhow::bail!("scan.image_concurrency cannot be 0");
    }

    if config.provider.resolved_api_key().is_none() {
        tracing::warn!("No TMDB API key configured; metadata lookups will find nothing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestream_common::{FolderId, MediaKind};

    #[test]
    fn defaults_apply_to_empty_file() {
        let config = parse_config("").unwrap();
        assert!(config.folders.is_empty());
        assert_eq!(config.provider.language, "en-US");
        assert_eq!(
            config.provider.image_base_url,
            "https://image.tmdb.org/t/p/original"
        );
        assert!(config.scan.save_images);
        assert_eq!(config.scan.image_concurrency, 5);
        assert_eq!(config.watch.settle_time_secs, 30);
        assert!(!config.watch.enabled);
    }

    #[test]
    fn parses_folders() {
        let config = parse_config(
            r#"
            data_dir = "/var/lib/homestream"

            [[folders]]
            id = 1
            name = "Movies"
            path = "/media/movies"
            media_kind = "movie"

            [[folders]]
            id = 2
            name = "Shows"
            path = "/media/tv"
            media_kind = "tv_show"

            [provider]
            api_key = "abc"
            language = "fr-FR"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, std::path::PathBuf::from("/var/lib/homestream"));
        assert_eq!(config.folders.len(), 2);
        let shows = config.folder(FolderId::from(2)).unwrap();
        assert_eq!(shows.media_kind, MediaKind::TvShow);
        assert_eq!(config.provider.resolved_api_key().as_deref(), Some("abc"));
        assert_eq!(config.provider.language, "fr-FR");
    }

    #[test]
    fn duplicate_folder_ids_rejected() {
        let err = parse_config(
            r#"
            [[folders]]
            id = 1
            name = "A"
            path = "/a"
            media_kind = "movie"

            [[folders]]
            id = 1
            name = "B"
            path = "/b"
            media_kind = "movie"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn zero_concurrency_rejected() {
        assert!(parse_config("[scan]\nimage_concurrency = 0\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("homestream.toml");
        std::fs::write(&path, "[scan]\nsave_images = false\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.scan.save_images);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn api_key_from_environment() {
        std::env::set_var("TMDB_API_KEY", "from-env");
        let config = parse_config("").unwrap();
        assert_eq!(config.provider.resolved_api_key().as_deref(), Some("from-env"));
        std::env::remove_var("TMDB_API_KEY");
        assert_eq!(config.provider.resolved_api_key(), None);
    }
}
