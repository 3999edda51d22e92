//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Artwork appended to detail requests and picked by language: configured
//!   language, then English, then any.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use homestream_common::{CollectionId, MediaId, MediaKind};
use homestream_store::{
    CollectionImages, CollectionRecord, EpisodeMetadata, ImageRefs, MovieMetadata,
    SeasonMetadata, ShowMetadata,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::metadata::provider::{MetadataProvider, SearchResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const REQUESTS_PER_SECOND: u32 = 4;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvSearchResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    genres: Option<Vec<TmdbGenre>>,
    belongs_to_collection: Option<TmdbCollectionRef>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    images: TmdbImagesResponse,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetail {
    name: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
    genres: Option<Vec<TmdbGenre>>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    images: TmdbImagesResponse,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonDetail {
    id: Option<u64>,
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisodeDetail {
    id: Option<u64>,
    name: Option<String>,
    overview: Option<String>,
    air_date: Option<String>,
    runtime: Option<u32>,
    still_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCollectionDetail {
    id: u64,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCollectionRef {
    id: u64,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbImagesResponse {
    #[serde(default)]
    posters: Vec<TmdbImage>,
    #[serde(default)]
    backdrops: Vec<TmdbImage>,
    #[serde(default)]
    logos: Vec<TmdbImage>,
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
    iso_639_1: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// Wraps the TMDB v3 REST API with built-in rate limiting and retry logic.
///
/// # Examples
///
/// ```no_run
/// use homestream::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into()).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a new TMDB provider with the given API key and language.
    ///
    /// The `language` parameter is a tag such as `"en-US"`. Rate limiting is
    /// configured at 4 requests per second.
    pub fn new(api_key: String, language: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, language, TMDB_BASE_URL.to_string())
    }

    /// Create a provider that talks to a different API root (e.g. a mock server).
    pub fn with_base_url(
        api_key: String,
        language: String,
        base_url: String,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));
        Ok(Self {
            client,
            api_key,
            language,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("TMDB request failed: {}", redact(url)))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let resp = resp
                .error_for_status()
                .with_context(|| format!("TMDB request returned error: {}", redact(url)))?;

            return Ok(resp);
        }
    }

    /// GET and decode a JSON document.
    ///
    /// A 404 is a plain miss and yields `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<Option<T>> {
        match self.get(url).await {
            Ok(resp) => {
                let body = resp
                    .json::<T>()
                    .await
                    .with_context(|| format!("failed to parse TMDB response: {}", redact(url)))?;
                Ok(Some(body))
            }
            Err(e)
                if e.downcast_ref::<reqwest::Error>()
                    .and_then(|re| re.status())
                    == Some(StatusCode::NOT_FOUND) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch and log, collapsing every failure into `None`.
    async fn lookup<T: DeserializeOwned>(&self, what: &str, url: &str) -> Option<T> {
        if !self.is_available() {
            return None;
        }
        debug!(url = %redact(url), "TMDB {what}");
        match self.fetch(url).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %format!("{e:#}"), "TMDB {what} failed");
                None
            }
        }
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoded(&self.api_key),
            urlencoded(&self.language)
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    /// ISO-639-1 part of the configured language (`"en-US"` is `"en"`).
    fn image_language(&self) -> &str {
        self.language.split('-').next().unwrap_or_default()
    }

    /// Details URL with artwork appended in the configured language, English
    /// and language-neutral variants.
    fn details_url(&self, path: &str) -> String {
        let languages = match self.image_language() {
            "en" => "en,null".to_string(),
            lang => format!("{lang},en,null"),
        };
        self.url(
            path,
            &[
                ("append_to_response", "images"),
                ("include_image_language", languages.as_str()),
            ],
        )
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Strip the API key from a URL before it reaches a log line.
fn redact(url: &str) -> String {
    match (url.find("api_key="), url.find("&language=")) {
        (Some(start), Some(end)) if start < end => {
            format!("{}api_key=***{}", &url[..start], &url[end..])
        }
        _ => url.to_string(),
    }
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

/// Pick an image path: preferred language, then English, then the first one.
fn pick_image(images: &[TmdbImage], language: &str) -> Option<String> {
    let by_language = |lang: &str| {
        images
            .iter()
            .find(|img| img.iso_639_1.as_deref() == Some(lang))
            .map(|img| img.file_path.clone())
    };

    by_language(language)
        .or_else(|| by_language("en"))
        .or_else(|| images.first().map(|img| img.file_path.clone()))
}

fn select_images(
    images: &TmdbImagesResponse,
    language: &str,
    poster_fallback: Option<String>,
    backdrop_fallback: Option<String>,
) -> ImageRefs {
    ImageRefs {
        backdrop_path: pick_image(&images.backdrops, language).or(backdrop_fallback),
        logo_path: pick_image(&images.logos, language),
        poster_path: pick_image(&images.posters, language).or(poster_fallback),
    }
}

fn genre_names(genres: Option<Vec<TmdbGenre>>) -> Vec<String> {
    genres
        .unwrap_or_default()
        .into_iter()
        .map(|g| g.name)
        .collect()
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, kind: MediaKind, title: &str, year: Option<&str>) -> Vec<SearchResult> {
        match kind {
            MediaKind::Movie => {
                let mut params = vec![("query", title)];
                if let Some(y) = year {
                    params.push(("year", y));
                }
                let url = self.url("/search/movie", &params);
                let body: Option<TmdbSearchResponse<TmdbMovieSearchResult>> =
                    self.lookup("search movie", &url).await;

                body.map(|b| b.results)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| SearchResult {
                        id: MediaId::from(r.id),
                        title: r.title.unwrap_or_default(),
                        year: parse_year(&r.release_date),
                        overview: r.overview,
                        poster_path: r.poster_path,
                    })
                    .collect()
            }
            MediaKind::TvShow => {
                let mut params = vec![("query", title)];
                if let Some(y) = year {
                    params.push(("first_air_date_year", y));
                }
                let url = self.url("/search/tv", &params);
                let body: Option<TmdbSearchResponse<TmdbTvSearchResult>> =
                    self.lookup("search TV", &url).await;

                body.map(|b| b.results)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| SearchResult {
                        id: MediaId::from(r.id),
                        title: r.name.unwrap_or_default(),
                        year: parse_year(&r.first_air_date),
                        overview: r.overview,
                        poster_path: r.poster_path,
                    })
                    .collect()
            }
        }
    }

    async fn movie_details(&self, id: MediaId) -> Option<MovieMetadata> {
        let url = self.details_url(&format!("/movie/{id}"));
        let detail: TmdbMovieDetail = self.lookup("movie details", &url).await?;

        Some(MovieMetadata {
            title: detail.title.unwrap_or_default(),
            original_title: detail.original_title,
            overview: detail.overview,
            release_date: detail.release_date,
            runtime: detail.runtime,
            genres: genre_names(detail.genres),
            collection_id: detail
                .belongs_to_collection
                .map(|c| CollectionId::from(c.id)),
            images: select_images(
                &detail.images,
                self.image_language(),
                detail.poster_path,
                detail.backdrop_path,
            ),
        })
    }

    async fn show_details(&self, id: MediaId) -> Option<ShowMetadata> {
        let url = self.details_url(&format!("/tv/{id}"));
        let detail: TmdbTvDetail = self.lookup("TV details", &url).await?;

        Some(ShowMetadata {
            title: detail.name.unwrap_or_default(),
            original_title: detail.original_name,
            overview: detail.overview,
            first_air_date: detail.first_air_date,
            genres: genre_names(detail.genres),
            images: select_images(
                &detail.images,
                self.image_language(),
                detail.poster_path,
                detail.backdrop_path,
            ),
        })
    }

    async fn season_details(&self, show: MediaId, season: u32) -> Option<SeasonMetadata> {
        let url = self.url(&format!("/tv/{show}/season/{season}"), &[]);
        let detail: TmdbSeasonDetail = self.lookup("season details", &url).await?;

        Some(SeasonMetadata {
            id: detail.id,
            name: detail.name.unwrap_or_else(|| format!("Season {season}")),
            overview: detail.overview,
            air_date: detail.air_date,
            poster_path: detail.poster_path,
        })
    }

    async fn episode_details(
        &self,
        show: MediaId,
        season: u32,
        episode: u32,
    ) -> Option<EpisodeMetadata> {
        let url = self.url(
            &format!("/tv/{show}/season/{season}/episode/{episode}"),
            &[],
        );
        let detail: TmdbEpisodeDetail = self.lookup("episode details", &url).await?;

        Some(EpisodeMetadata {
            id: detail.id,
            title: detail.name.unwrap_or_else(|| format!("Episode {episode}")),
            overview: detail.overview,
            air_date: detail.air_date,
            runtime: detail.runtime,
            still_path: detail.still_path,
        })
    }

    async fn collection_details(&self, id: CollectionId) -> Option<CollectionRecord> {
        let url = self.url(&format!("/collection/{id}"), &[]);
        let detail: TmdbCollectionDetail = self.lookup("collection details", &url).await?;

        Some(CollectionRecord {
            id: CollectionId::from(detail.id),
            name: detail.name.unwrap_or_default(),
            overview: detail.overview,
            images: CollectionImages {
                backdrop_path: detail.backdrop_path,
                poster_path: detail.poster_path,
            },
        })
    }
}
