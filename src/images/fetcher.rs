//! Bounded-concurrency image downloads.
//!
//! Each job streams its response body into a `.part` file beside the
//! destination and renames it into place once the body is complete, so a
//! reader never sees a truncated image. A failed job is logged and counted;
//! it never cancels the rest of the batch.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of transfers in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// One image to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub url: String,
    pub destination: PathBuf,
}

impl FetchJob {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }
}

/// Outcome counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Downloads artwork into the local cache.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: reqwest::Client,
    concurrency: usize,
}

impl AssetFetcher {
    pub fn new(concurrency: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(client, concurrency))
    }

    pub fn with_client(client: reqwest::Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Download one image. Returns `false` (after logging) on any failure.
    pub async fn fetch_one(&self, url: &str, destination: &Path) -> bool {
        let part = part_path(destination);
        match self.download(url, destination, &part).await {
            Ok(bytes) => {
                debug!(url = %url, path = ?destination, bytes, "Image cached");
                true
            }
            Err(e) => {
                warn!(
                    url = %url,
                    path = ?destination,
                    error = %format!("{e:#}"),
                    "Image download failed"
                );
                let _ = tokio::fs::remove_file(&part).await;
                false
            }
        }
    }

    /// Download every job with at most `concurrency` transfers in flight.
    ///
    /// Jobs sharing a destination are fetched once. Returns once every job has
    /// finished, successfully or not.
    pub async fn fetch_many(&self, mut jobs: Vec<FetchJob>) -> FetchSummary {
        let mut seen = HashSet::new();
        jobs.retain(|job| seen.insert(job.destination.clone()));
        if jobs.is_empty() {
            return FetchSummary::default();
        }
        debug!(jobs = jobs.len(), concurrency = self.concurrency, "Fetching images");

        run_bounded(jobs, self.concurrency, |job| async move {
            self.fetch_one(&job.url, &job.destination).await
        })
        .await
    }

    async fn download(&self, url: &str, destination: &Path, part: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {:?}", parent))?;
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("server returned an error")?;

        let mut file = tokio::fs::File::create(part)
            .await
            .with_context(|| format!("failed to create {:?}", part))?;

        let mut written = 0u64;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("body stream interrupted")?;
            file.write_all(&chunk).await.context("write failed")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("flush failed")?;
        drop(file);

        tokio::fs::rename(part, destination)
            .await
            .with_context(|| format!("failed to move image into {:?}", destination))?;
        Ok(written)
    }
}

/// Run `task` over `items` with at most `limit` futures in flight, counting
/// `true` results as successes.
pub async fn run_bounded<T, F, Fut>(items: Vec<T>, limit: usize, task: F) -> FetchSummary
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = bool>,
{
    stream::iter(items)
        .map(task)
        .buffer_unordered(limit.max(1))
        .fold(FetchSummary::default(), |mut summary, ok| async move {
            if ok {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
        .await
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}
