use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use homestream_common::{ImageKind, MediaKind};
use homestream_parser::{best_match_with_distance, parse_movie_filename};
use homestream_store::{CatalogRecord, MovieRecord};
use tracing::{debug, error, info};

use super::{DirEntry, ImportOutcome, LibraryScanner, ScanContext};
use crate::config::Folder;
use crate::images::cache::movie_image_path;
use crate::images::FetchJob;

impl LibraryScanner {
    pub(crate) async fn scan_movies(
        &self,
        folder: &Folder,
        files: &[DirEntry],
        ctx: &mut ScanContext,
    ) {
        let catalogued: HashMap<PathBuf, MovieRecord> = self
            .store
            .list(folder.id)
            .into_iter()
            .filter_map(|entry| match entry.record {
                CatalogRecord::Movie(movie) => Some((movie.path.clone(), movie)),
                CatalogRecord::TvShow(_) => None,
            })
            .collect();

        for (index, file) in files.iter().enumerate() {
            self.report_progress(folder.id, ctx, index, &file.path);

            if let Some(movie) = catalogued.get(&file.path) {
                debug!(path = ?file.path, "Movie already catalogued");
                self.queue_movie_images(movie, &mut ctx.jobs);
                ctx.report.record(ImportOutcome::AlreadyCatalogued);
                continue;
            }

            let outcome = self
                .import_movie(folder, &file.path, file.created, &mut ctx.jobs)
                .await;
            ctx.report.record(outcome);
        }
    }

    /// Parse, match, fetch and record one movie file.
    ///
    /// The caller is responsible for holding the folder lock.
    pub(crate) async fn import_movie(
        &self,
        folder: &Folder,
        path: &Path,
        created: Option<SystemTime>,
        jobs: &mut Vec<FetchJob>,
    ) -> ImportOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_movie_filename(&file_name);
        if parsed.title.is_empty() {
            debug!(path = ?path, "No title in movie filename");
            return ImportOutcome::Unmatched;
        }

        let results = self
            .provider
            .search(MediaKind::Movie, &parsed.title, parsed.year.as_deref())
            .await;
        let Some((best, distance)) = best_match_with_distance(&parsed.title, &results) else {
            info!(title = %parsed.title, year = ?parsed.year, "No provider match for movie");
            return ImportOutcome::Unmatched;
        };
        debug!(query = %parsed.title, matched = %best.title, distance, "Matched movie");

        if let Some(existing) = self.store.get(folder.id, best.id) {
            // Same movie under another file: the first recorded path stays.
            debug!(
                id = %best.id,
                kept = ?existing.path(),
                ignored = ?path,
                "Movie id already catalogued"
            );
            if let CatalogRecord::Movie(movie) = &existing {
                self.queue_movie_images(movie, jobs);
            }
            return ImportOutcome::AlreadyCatalogued;
        }

        let Some(metadata) = self.provider.movie_details(best.id).await else {
            info!(id = %best.id, title = %best.title, "Provider has no details for movie");
            return ImportOutcome::Unmatched;
        };

        let record = MovieRecord {
            id: best.id,
            path: path.to_path_buf(),
            metadata,
            added_at: created.map(DateTime::<Utc>::from).unwrap_or_else(Utc::now),
        };

        if let Err(e) = self.store.put(folder.id, &CatalogRecord::Movie(record.clone())) {
            error!(id = %record.id, path = ?path, error = %e, "Failed to record movie");
            return ImportOutcome::Failed;
        }

        info!(
            folder = %folder.id,
            id = %record.id,
            title = %record.metadata.title,
            "Added movie: {:?}",
            path
        );
        self.queue_movie_images(&record, jobs);
        ImportOutcome::Added
    }

    /// Queue any artwork of `movie` that is not cached yet.
    pub(crate) fn queue_movie_images(&self, movie: &MovieRecord, jobs: &mut Vec<FetchJob>) {
        let images = &movie.metadata.images;
        for (kind, fragment) in [
            (ImageKind::Backdrop, images.backdrop_path.as_deref()),
            (ImageKind::Logo, images.logo_path.as_deref()),
            (ImageKind::Poster, images.poster_path.as_deref()),
        ] {
            self.queue_image(jobs, fragment, movie_image_path(&movie.path, kind));
        }
    }
}
