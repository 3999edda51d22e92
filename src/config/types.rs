use homestream_common::{FolderId, MediaKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root of the catalog, image cache and subtitle cache.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            folders: Vec::new(),
            provider: ProviderConfig::default(),
            scan: ScanConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Config {
    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.config/homestream_server").as_ref())
}

/// A configured library root. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Folder {
    pub id: FolderId,

    pub name: String,

    pub path: PathBuf,

    pub media_kind: MediaKind,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// TMDB v3 API key (falls back to the TMDB_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Language requested for metadata and preferred for artwork
    #[serde(default = "default_language")]
    pub language: String,

    /// Prefix joined with provider image path fragments
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Override of the provider API root (used by tests)
    #[serde(default)]
    pub api_base_url: Option<String>,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: default_language(),
            image_base_url: default_image_base_url(),
            api_base_url: None,
        }
    }
}

impl ProviderConfig {
    /// The configured key, or `TMDB_API_KEY` from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("TMDB_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Download artwork into the local cache while scanning
    #[serde(default = "default_save_images")]
    pub save_images: bool,

    /// Maximum image downloads in flight
    #[serde(default = "default_image_concurrency")]
    pub image_concurrency: usize,
}

fn default_save_images() -> bool {
    true
}

fn default_image_concurrency() -> usize {
    5
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            save_images: default_save_images(),
            image_concurrency: default_image_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Seconds a new file must stay unchanged before it is indexed
    #[serde(default = "default_settle_time")]
    pub settle_time_secs: u64,

    /// Extensions indexed by scans and watch events (empty = built-in video
    /// extensions)
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_settle_time() -> u64 {
    30
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            settle_time_secs: default_settle_time(),
            extensions: Vec::new(),
        }
    }
}
