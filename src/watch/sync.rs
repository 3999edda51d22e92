use std::path::Path;

use homestream_common::{MediaId, MediaKind};
use homestream_parser::{parse_episode_filename, parse_episode_number, parse_season_directory};
use homestream_store::{CatalogRecord, TvShowRecord};
use tracing::{debug, error, warn};

use super::{SyncWatcher, WatchEvent, WatchEventKind};
use crate::config::Folder;
use crate::images::FetchJob;
use crate::scanner::{file_created, ImportOutcome};

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Imported(ImportOutcome),
    Removed,
    /// Nothing in the catalog refers to the removed path.
    Ignored,
    Failed,
}

/// A catalogued show an added file belongs to.
struct KnownShow {
    show: TvShowRecord,
    season: Option<u32>,
}

impl SyncWatcher {
    /// Apply one event to `folder`'s catalog.
    ///
    /// The caller is responsible for holding the folder lock.
    pub async fn apply(&self, folder: &Folder, event: &WatchEvent) -> WatchOutcome {
        match (event.kind, folder.media_kind) {
            (WatchEventKind::Added, MediaKind::Movie) => self.add_movie(folder, &event.path).await,
            (WatchEventKind::Added, MediaKind::TvShow) => {
                self.add_episode(folder, &event.path).await
            }
            (WatchEventKind::Removed, MediaKind::Movie) => self.remove_movie(folder, &event.path),
            (WatchEventKind::Removed, MediaKind::TvShow) => {
                self.remove_episode(folder, &event.path)
            }
        }
    }

    async fn add_movie(&self, folder: &Folder, path: &Path) -> WatchOutcome {
        if self.scanner.store().find_by_path(folder.id, path).is_some() {
            debug!(path = ?path, "Movie already catalogued");
            return WatchOutcome::Imported(ImportOutcome::AlreadyCatalogued);
        }

        let mut jobs = Vec::new();
        let outcome = self
            .scanner
            .import_movie(folder, path, file_created(path), &mut jobs)
            .await;
        self.fetch_images(jobs).await;
        WatchOutcome::Imported(outcome)
    }

    async fn add_episode(&self, folder: &Folder, path: &Path) -> WatchOutcome {
        if self
            .scanner
            .store()
            .find_episode_by_path(folder.id, path)
            .is_some()
        {
            debug!(path = ?path, "Episode already catalogued");
            return WatchOutcome::Imported(ImportOutcome::AlreadyCatalogued);
        }

        let mut jobs = Vec::new();
        let numbers = self
            .known_show(folder, path)
            .and_then(|known| episode_numbers(path, known.season).map(|n| (known.show, n)));

        let outcome = match numbers {
            Some((show, (season, episode))) => {
                self.scanner
                    .import_into_show(folder, &show, season, episode, path, &mut jobs)
                    .await
            }
            None => self.scanner.import_episode(folder, path, &mut jobs).await,
        };
        self.fetch_images(jobs).await;
        WatchOutcome::Imported(outcome)
    }

    /// The show owning the file's directory: first a season recorded at that
    /// directory, then a show whose root contains the file.
    fn known_show(&self, folder: &Folder, path: &Path) -> Option<KnownShow> {
        let store = self.scanner.store();
        let dir = path.parent()?;

        let shows: Vec<TvShowRecord> = store
            .list(folder.id)
            .into_iter()
            .filter_map(|entry| match entry.record {
                CatalogRecord::TvShow(show) => Some(show),
                CatalogRecord::Movie(_) => None,
            })
            .collect();

        for show in &shows {
            for season in store.list_seasons(folder.id, show.id) {
                if season.record.path.as_deref() == Some(dir) {
                    return Some(KnownShow {
                        show: show.clone(),
                        season: Some(season.record.season_number),
                    });
                }
            }
        }

        shows
            .into_iter()
            .find(|show| {
                show.root_path
                    .as_deref()
                    .is_some_and(|root| path.starts_with(root))
            })
            .map(|show| KnownShow { show, season: None })
    }

    fn remove_movie(&self, folder: &Folder, path: &Path) -> WatchOutcome {
        let store = self.scanner.store();
        let Some(entry) = store.find_by_path(folder.id, path) else {
            debug!(path = ?path, "Removed file was not catalogued");
            return WatchOutcome::Ignored;
        };
        let Some(movie) = entry.record.as_movie() else {
            return WatchOutcome::Ignored;
        };

        self.purge_subtitles(movie.id);
        match store.remove(folder.id, movie.id) {
            Ok(_) => WatchOutcome::Removed,
            Err(e) => {
                error!(id = %movie.id, error = %e, "Failed to remove movie");
                WatchOutcome::Failed
            }
        }
    }

    fn remove_episode(&self, folder: &Folder, path: &Path) -> WatchOutcome {
        let store = self.scanner.store();
        let Some(location) = store.find_episode_by_path(folder.id, path) else {
            debug!(path = ?path, "Removed file was not catalogued");
            return WatchOutcome::Ignored;
        };

        if let Some(id) = location.episode.metadata.id {
            self.purge_subtitles(MediaId::from(id));
        }
        match store.remove_episode(
            folder.id,
            location.show_id,
            location.season_number,
            location.episode.episode_number,
        ) {
            Ok(_) => WatchOutcome::Removed,
            Err(e) => {
                error!(show = %location.show_id, error = %e, "Failed to remove episode");
                WatchOutcome::Failed
            }
        }
    }

    fn purge_subtitles(&self, id: MediaId) {
        if let Err(e) = self.subtitles.purge(id) {
            warn!(id = %id, error = %e, "Failed to purge subtitles");
        }
    }

    async fn fetch_images(&self, jobs: Vec<FetchJob>) {
        if jobs.is_empty() {
            return;
        }
        let summary = self.scanner.fetch_images(jobs).await;
        debug!(fetched = summary.succeeded, failed = summary.failed, "Fetched images");
    }
}

/// Season and episode numbers for a file under a known show: the canonical
/// name if it parses, else the loose heuristics.
fn episode_numbers(path: &Path, known_season: Option<u32>) -> Option<(u32, u32)> {
    let file_name = path.file_name()?.to_str()?;
    if let Some(parsed) = parse_episode_filename(file_name) {
        return Some((parsed.season_number(), parsed.episode_number()));
    }

    let season = known_season.or_else(|| {
        path.parent()?
            .file_name()?
            .to_str()
            .and_then(parse_season_directory)
    })?;
    let episode = parse_episode_number(file_name)?;
    Some((season, episode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_wins() {
        assert_eq!(
            episode_numbers(Path::new("/tv/Lost/Season 1/Lost S02E03.mkv"), Some(1)),
            Some((2, 3))
        );
    }

    #[test]
    fn loose_name_uses_known_season() {
        assert_eq!(
            episode_numbers(Path::new("/tv/Lost/Extras/Pilot E01.mkv"), Some(4)),
            Some((4, 1))
        );
    }

    #[test]
    fn loose_name_reads_season_directory() {
        assert_eq!(
            episode_numbers(Path::new("/tv/Lost/Season 03/Episode 7.mkv"), None),
            Some((3, 7))
        );
        assert_eq!(episode_numbers(Path::new("/tv/Lost/Specials/Episode 7.mkv"), None), None);
        assert_eq!(episode_numbers(Path::new("/tv/Lost/Season 1/trailer.mkv"), None), None);
    }
}
