//! TV folder handling: show, season and episode levels.
//!
//! Each level is looked up in the catalog first and only fetched from the
//! provider when missing, so an episode of a known show costs at most two
//! provider calls (season and episode).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use homestream_common::{ImageKind, MediaId, MediaKind};
use homestream_parser::{best_match_with_distance, parse_episode_filename};
use homestream_store::{
    CatalogRecord, EpisodeMetadata, EpisodeRecord, SeasonMetadata, SeasonRecord, TvShowRecord,
};
use tracing::{debug, error, info};

use super::{DirEntry, ImportOutcome, LibraryScanner, ScanContext};
use crate::config::Folder;
use crate::images::cache::catalog_image_path;
use crate::images::FetchJob;

type CataloguedEpisode = (TvShowRecord, SeasonRecord, EpisodeRecord);

impl LibraryScanner {
    pub(crate) async fn scan_shows(
        &self,
        folder: &Folder,
        files: &[DirEntry],
        ctx: &mut ScanContext,
    ) {
        let catalogued = self.catalogued_episode_paths(folder);

        for (index, file) in files.iter().enumerate() {
            self.report_progress(folder.id, ctx, index, &file.path);

            if let Some((show, season, episode)) = catalogued.get(&file.path) {
                debug!(path = ?file.path, "Episode already catalogued");
                self.queue_show_images(folder, show, &mut ctx.jobs);
                self.queue_season_images(folder, show.id, season, &mut ctx.jobs);
                self.queue_episode_images(
                    folder,
                    show.id,
                    season.season_number,
                    episode,
                    &mut ctx.jobs,
                );
                ctx.report.record(ImportOutcome::AlreadyCatalogued);
                continue;
            }

            let outcome = self.import_episode(folder, &file.path, &mut ctx.jobs).await;
            ctx.report.record(outcome);
        }
    }

    /// Every recorded episode of the folder keyed by its file.
    fn catalogued_episode_paths(&self, folder: &Folder) -> HashMap<PathBuf, CataloguedEpisode> {
        let mut paths = HashMap::new();
        for entry in self.store.list(folder.id) {
            let CatalogRecord::TvShow(show) = entry.record else {
                continue;
            };
            for season in self.store.list_seasons(folder.id, show.id) {
                let season = season.record;
                for episode in self.store.list_episodes(folder.id, show.id, season.season_number) {
                    let episode = episode.record;
                    paths.insert(
                        episode.path.clone(),
                        (show.clone(), season.clone(), episode),
                    );
                }
            }
        }
        paths
    }

    /// Import one episode file from its canonical `TITLE [(YEAR)] S##E##`
    /// name, creating the show and season as needed.
    ///
    /// The caller is responsible for holding the folder lock.
    pub(crate) async fn import_episode(
        &self,
        folder: &Folder,
        path: &Path,
        jobs: &mut Vec<FetchJob>,
    ) -> ImportOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(parsed) = parse_episode_filename(&file_name) else {
            debug!(path = ?path, "Not an episode filename");
            return ImportOutcome::Unmatched;
        };

        let show = match self
            .ensure_show(folder, &parsed.title, parsed.year.as_deref(), path, jobs)
            .await
        {
            Ok(Some(show)) => show,
            Ok(None) => return ImportOutcome::Unmatched,
            Err(e) => {
                error!(path = ?path, error = %e, "Failed to record show");
                return ImportOutcome::Failed;
            }
        };

        self.import_into_show(
            folder,
            &show,
            parsed.season_number(),
            parsed.episode_number(),
            path,
            jobs,
        )
        .await
    }

    /// Find the show locally by title, else search and record it.
    async fn ensure_show(
        &self,
        folder: &Folder,
        title: &str,
        year: Option<&str>,
        path: &Path,
        jobs: &mut Vec<FetchJob>,
    ) -> anyhow::Result<Option<TvShowRecord>> {
        let existing = self.store.list(folder.id).into_iter().find_map(|entry| {
            entry
                .record
                .as_show()
                .filter(|show| show.metadata.title.eq_ignore_ascii_case(title))
                .cloned()
        });
        if let Some(show) = existing {
            self.queue_show_images(folder, &show, jobs);
            return Ok(Some(show));
        }

        let results = self.provider.search(MediaKind::TvShow, title, year).await;
        let Some((best, distance)) = best_match_with_distance(title, &results) else {
            info!(title = %title, year = ?year, "No provider match for show");
            return Ok(None);
        };
        debug!(query = %title, matched = %best.title, distance, "Matched show");

        if let Some(CatalogRecord::TvShow(show)) = self.store.get(folder.id, best.id) {
            self.queue_show_images(folder, &show, jobs);
            return Ok(Some(show));
        }

        let Some(metadata) = self.provider.show_details(best.id).await else {
            info!(id = %best.id, title = %best.title, "Provider has no details for show");
            return Ok(None);
        };

        let show = TvShowRecord {
            id: best.id,
            root_path: show_root(&folder.path, path),
            metadata,
        };
        self.store
            .put(folder.id, &CatalogRecord::TvShow(show.clone()))
            .with_context(|| format!("Failed to write show {}", show.id))?;

        info!(folder = %folder.id, id = %show.id, title = %show.metadata.title, "Added show");
        self.queue_show_images(folder, &show, jobs);
        Ok(Some(show))
    }

    /// Record an episode under a show that is already catalogued.
    pub(crate) async fn import_into_show(
        &self,
        folder: &Folder,
        show: &TvShowRecord,
        season_number: u32,
        episode_number: u32,
        path: &Path,
        jobs: &mut Vec<FetchJob>,
    ) -> ImportOutcome {
        if let Err(e) = self
            .ensure_season(folder, show.id, season_number, path, jobs)
            .await
        {
            error!(show = %show.id, season = season_number, error = %e, "Failed to record season");
            return ImportOutcome::Failed;
        }

        if let Some(existing) = self
            .store
            .get_episode(folder.id, show.id, season_number, episode_number)
        {
            self.queue_episode_images(folder, show.id, season_number, &existing, jobs);
            debug!(
                show = %show.id,
                season = season_number,
                episode = episode_number,
                "Episode already catalogued"
            );
            return ImportOutcome::AlreadyCatalogued;
        }

        let metadata = match self
            .provider
            .episode_details(show.id, season_number, episode_number)
            .await
        {
            Some(metadata) => metadata,
            None => {
                debug!(
                    show = %show.id,
                    season = season_number,
                    episode = episode_number,
                    "Using placeholder episode"
                );
                placeholder_episode(episode_number)
            }
        };

        let episode = EpisodeRecord {
            episode_number,
            path: path.to_path_buf(),
            metadata,
        };
        if let Err(e) = self
            .store
            .put_episode(folder.id, show.id, season_number, &episode)
        {
            error!(path = ?path, error = %e, "Failed to record episode");
            return ImportOutcome::Failed;
        }

        info!(
            folder = %folder.id,
            show = %show.metadata.title,
            season = season_number,
            episode = episode_number,
            "Added episode: {:?}",
            path
        );

        self.queue_episode_images(folder, show.id, season_number, &episode, jobs);
        ImportOutcome::Added
    }

    async fn ensure_season(
        &self,
        folder: &Folder,
        show: MediaId,
        season_number: u32,
        path: &Path,
        jobs: &mut Vec<FetchJob>,
    ) -> anyhow::Result<()> {
        if let Some(season) = self.store.get_season(folder.id, show, season_number) {
            self.queue_season_images(folder, show, &season, jobs);
            return Ok(());
        }

        let metadata = match self.provider.season_details(show, season_number).await {
            Some(metadata) => metadata,
            None => {
                debug!(show = %show, season = season_number, "Using placeholder season");
                placeholder_season(season_number)
            }
        };
        let season = SeasonRecord {
            season_number,
            path: path.parent().map(Path::to_path_buf),
            metadata,
        };
        self.store
            .put_season(folder.id, show, &season)
            .with_context(|| format!("Failed to write season {season_number} of show {show}"))?;

        self.queue_season_images(folder, show, &season, jobs);
        Ok(())
    }

    fn queue_season_images(
        &self,
        folder: &Folder,
        show: MediaId,
        season: &SeasonRecord,
        jobs: &mut Vec<FetchJob>,
    ) {
        let dir = self
            .store
            .layout()
            .season_dir(folder.id, show, season.season_number);
        self.queue_image(
            jobs,
            season.metadata.poster_path.as_deref(),
            catalog_image_path(&dir, ImageKind::Poster),
        );
    }

    fn queue_episode_images(
        &self,
        folder: &Folder,
        show: MediaId,
        season_number: u32,
        episode: &EpisodeRecord,
        jobs: &mut Vec<FetchJob>,
    ) {
        let dir = self
            .store
            .layout()
            .episode_dir(folder.id, show, season_number, episode.episode_number);
        self.queue_image(
            jobs,
            episode.metadata.still_path.as_deref(),
            catalog_image_path(&dir, ImageKind::Still),
        );
    }

    fn queue_show_images(&self, folder: &Folder, show: &TvShowRecord, jobs: &mut Vec<FetchJob>) {
        let dir = self.store.layout().item_dir(folder.id, show.id);
        let images = &show.metadata.images;
        for (kind, fragment) in [
            (ImageKind::Backdrop, images.backdrop_path.as_deref()),
            (ImageKind::Logo, images.logo_path.as_deref()),
            (ImageKind::Poster, images.poster_path.as_deref()),
        ] {
            self.queue_image(jobs, fragment, catalog_image_path(&dir, kind));
        }
    }
}

/// First directory below the folder root that contains `file`, or `None`
/// when the file sits directly in the root.
pub(crate) fn show_root(folder_root: &Path, file: &Path) -> Option<PathBuf> {
    let relative = file.strip_prefix(folder_root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // A lone component is the file itself.
    components.next()?;
    Some(folder_root.join(first))
}

fn placeholder_season(season_number: u32) -> SeasonMetadata {
    SeasonMetadata {
        name: format!("Season {season_number}"),
        ..Default::default()
    }
}

fn placeholder_episode(episode_number: u32) -> EpisodeMetadata {
    EpisodeMetadata {
        title: format!("Episode {episode_number}"),
        ..Default::default()
    }
}
