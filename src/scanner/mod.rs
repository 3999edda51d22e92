//! Media library scanner.
//!
//! Walks a configured folder, recognises movies or episodes from their
//! filenames, looks them up with the metadata provider and records matches in
//! the catalog. Artwork discovered along the way is downloaded in a single
//! bounded batch once the walk has finished.
//!
//! Every step is idempotent: a file that is already catalogued is skipped
//! without a provider call, so rescanning an unchanged folder leaves the
//! catalog exactly as it was.

pub mod collections;
pub mod lister;
mod movies;
mod tv;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use homestream_common::{paths::has_media_extension, FolderId, MediaKind};
use homestream_store::CatalogStore;
use tracing::{info, warn};

use crate::config::Folder;
use crate::images::{AssetFetcher, FetchJob, FetchSummary, ImageResolver};
use crate::locks::FolderLocks;
use crate::metadata::MetadataProvider;

pub use collections::group_by_collection;
pub use lister::{file_created, DirEntry, DirectoryLister, FsLister};

/// Progress callback for scan operations.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Scan progress information.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub folder: FolderId,
    pub files_found: usize,
    pub files_processed: usize,
    pub current_file: Option<PathBuf>,
}

/// Counters describing one folder scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Video files seen during the walk.
    pub files_found: usize,
    /// New movies or episodes recorded.
    pub added: usize,
    /// Files already catalogued.
    pub skipped: usize,
    /// Files whose name did not parse or that the provider could not match.
    pub unmatched: usize,
    /// Files whose record could not be written.
    pub failed: usize,
    pub images_fetched: usize,
    pub images_failed: usize,
    pub collections_created: usize,
}

impl ScanReport {
    pub(crate) fn record(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Added => self.added += 1,
            ImportOutcome::AlreadyCatalogued => self.skipped += 1,
            ImportOutcome::Unmatched => self.unmatched += 1,
            ImportOutcome::Failed => self.failed += 1,
        }
    }

    pub(crate) fn record_images(&mut self, summary: FetchSummary) {
        self.images_fetched += summary.succeeded;
        self.images_failed += summary.failed;
    }
}

/// Result of importing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Added,
    AlreadyCatalogued,
    Unmatched,
    Failed,
}

/// Mutable state threaded through one walk.
#[derive(Debug, Default)]
pub(crate) struct ScanContext {
    pub report: ScanReport,
    pub jobs: Vec<FetchJob>,
}

/// Scanner for discovering and cataloguing media files.
pub struct LibraryScanner {
    store: CatalogStore,
    provider: Arc<dyn MetadataProvider>,
    fetcher: AssetFetcher,
    resolver: ImageResolver,
    lister: Arc<dyn DirectoryLister>,
    locks: FolderLocks,
    save_images: bool,
    extensions: Vec<String>,
    progress: Option<ProgressCallback>,
}

impl LibraryScanner {
    pub fn new(
        store: CatalogStore,
        provider: Arc<dyn MetadataProvider>,
        fetcher: AssetFetcher,
        resolver: ImageResolver,
    ) -> Self {
        Self {
            store,
            provider,
            fetcher,
            resolver,
            lister: Arc::new(FsLister),
            locks: FolderLocks::new(),
            save_images: true,
            extensions: Vec::new(),
            progress: None,
        }
    }

    /// Replace the filesystem lister.
    pub fn with_lister(mut self, lister: Arc<dyn DirectoryLister>) -> Self {
        self.lister = lister;
        self
    }

    /// Share folder locks with another writer (the watcher).
    pub fn with_locks(mut self, locks: FolderLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_save_images(mut self, save_images: bool) -> Self {
        self.save_images = save_images;
        self
    }

    /// Index only files with these extensions. Empty means the default video
    /// extensions.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn locks(&self) -> &FolderLocks {
        &self.locks
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    /// Scan every folder in order.
    pub async fn scan_all(&self, folders: &[Folder]) -> Vec<(FolderId, ScanReport)> {
        let mut reports = Vec::with_capacity(folders.len());
        for folder in folders {
            reports.push((folder.id, self.scan_folder(folder).await));
        }
        reports
    }

    /// Scan one folder and return what changed.
    ///
    /// Holds the folder's lock for the whole walk and image batch.
    pub async fn scan_folder(&self, folder: &Folder) -> ScanReport {
        let _guard = self.locks.lock(folder.id).await;
        info!(
            folder = %folder.id,
            name = %folder.name,
            kind = %folder.media_kind,
            "Scanning folder: {:?}",
            folder.path
        );

        let files = self.collect_video_files(&folder.path);
        let mut ctx = ScanContext::default();
        ctx.report.files_found = files.len();

        match folder.media_kind {
            MediaKind::Movie => {
                self.scan_movies(folder, &files, &mut ctx).await;
                self.group_collections(folder.id, &mut ctx).await;
            }
            MediaKind::TvShow => self.scan_shows(folder, &files, &mut ctx).await,
        }

        let jobs = std::mem::take(&mut ctx.jobs);
        let summary = self.fetcher.fetch_many(jobs).await;
        ctx.report.record_images(summary);

        let report = ctx.report;
        info!(
            folder = %folder.id,
            found = report.files_found,
            added = report.added,
            skipped = report.skipped,
            unmatched = report.unmatched,
            failed = report.failed,
            images = report.images_fetched,
            collections = report.collections_created,
            "Scan complete"
        );
        report
    }

    /// Depth-first walk with an explicit stack. Unreadable directories are
    /// logged and skipped.
    fn collect_video_files(&self, root: &Path) -> Vec<DirEntry> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = match self.lister.list(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory {:?}", dir);
                    continue;
                }
            };

            // Reverse so the first listed subdirectory is visited first.
            let mut subdirs = Vec::new();
            for entry in entries {
                if entry.is_dir {
                    subdirs.push(entry.path);
                } else if has_media_extension(&entry.path, &self.extensions) {
                    files.push(entry);
                }
            }
            stack.extend(subdirs.into_iter().rev());
        }

        files
    }

    fn report_progress(&self, folder: FolderId, ctx: &ScanContext, processed: usize, file: &Path) {
        if let Some(progress) = &self.progress {
            progress(ScanProgress {
                folder,
                files_found: ctx.report.files_found,
                files_processed: processed,
                current_file: Some(file.to_path_buf()),
            });
        }
    }

    /// Queue a download when images are enabled and the fragment exists.
    fn queue_image(&self, jobs: &mut Vec<FetchJob>, fragment: Option<&str>, destination: PathBuf) {
        if !self.save_images {
            return;
        }
        if let Some(job) = self.resolver.job(fragment, destination) {
            jobs.push(job);
        }
    }

    /// Download a handful of jobs queued outside a full scan.
    pub(crate) async fn fetch_images(&self, jobs: Vec<FetchJob>) -> FetchSummary {
        self.fetcher.fetch_many(jobs).await
    }
}
