//! Filesystem event source backed by `notify`.
//!
//! Raw notify events are translated into [`WatchEvent`]s. Additions wait in a
//! [`FileSettleTracker`] until the file stops changing; removals are forwarded
//! at once and cancel any pending addition of the same path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::settle::FileSettleTracker;
use super::{WatchEvent, WatchEventKind};

const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(5);
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Live notify watcher feeding a [`WatchEvent`] channel.
///
/// Dropping it stops both the notify watcher and the settle task.
pub struct FsEventSource {
    _watcher: RecommendedWatcher,
    settle_task: JoinHandle<()>,
}

impl FsEventSource {
    /// Watch every path recursively and forward events to `sink`.
    pub fn start(
        paths: &[PathBuf],
        settle_time: Duration,
        sink: mpsc::Sender<WatchEvent>,
    ) -> Result<Self> {
        let tracker = Arc::new(Mutex::new(FileSettleTracker::new(settle_time)));

        let callback_tracker = tracker.clone();
        let removal_sink = sink.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "File watcher error");
                    return;
                }
            };

            for watch_event in translate(&event) {
                match watch_event.kind {
                    WatchEventKind::Added => {
                        callback_tracker.lock().file_changed(watch_event.path);
                    }
                    WatchEventKind::Removed => {
                        callback_tracker.lock().cancel(&watch_event.path);
                        if removal_sink.blocking_send(watch_event).is_err() {
                            debug!("Watch event receiver closed");
                        }
                    }
                }
            }
        })
        .context("Failed to create file watcher")?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .with_context(|| format!("Failed to watch path: {:?}", path))?;
                info!("Watching directory: {:?}", path);
            } else {
                warn!("Watch path does not exist: {:?}", path);
            }
        }

        let settle_task = tokio::spawn(forward_settled(tracker, sink));

        Ok(Self {
            _watcher: watcher,
            settle_task,
        })
    }
}

impl Drop for FsEventSource {
    fn drop(&mut self) {
        self.settle_task.abort();
    }
}

async fn forward_settled(tracker: Arc<Mutex<FileSettleTracker>>, sink: mpsc::Sender<WatchEvent>) {
    let period = tracker
        .lock()
        .settle_duration()
        .clamp(MIN_CHECK_INTERVAL, MAX_CHECK_INTERVAL);
    let mut check_interval = tokio::time::interval(period);

    loop {
        check_interval.tick().await;

        let settled = tracker.lock().take_settled(Instant::now());
        for path in settled {
            if !path.is_file() {
                continue;
            }
            info!("File settled: {:?}", path);
            if let Err(e) = sink.send(WatchEvent::added(path)).await {
                error!("Failed to send settled file: {}", e);
                return;
            }
        }
    }
}

/// Map one notify event onto additions and removals.
///
/// Content modifications count as additions so they restart the settle
/// timer of a file still being written.
pub fn translate(event: &Event) -> Vec<WatchEvent> {
    let paths = event.paths.iter().cloned();
    match event.kind {
        EventKind::Create(_) => paths.map(WatchEvent::added).collect(),
        EventKind::Remove(_) => paths.map(WatchEvent::removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(WatchEvent::removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(WatchEvent::added).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![WatchEvent::removed(from.clone()), WatchEvent::added(to.clone())],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths.map(WatchEvent::added).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(PathBuf::from(p)))
    }

    #[test]
    fn create_and_remove() {
        assert_eq!(
            translate(&event(EventKind::Create(CreateKind::File), &["/m/a.mkv"])),
            vec![WatchEvent::added(PathBuf::from("/m/a.mkv"))]
        );
        assert_eq!(
            translate(&event(EventKind::Remove(RemoveKind::File), &["/m/a.mkv"])),
            vec![WatchEvent::removed(PathBuf::from("/m/a.mkv"))]
        );
    }

    #[test]
    fn rename_becomes_remove_then_add() {
        let renamed = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/m/old.mkv", "/m/new.mkv"],
        );
        assert_eq!(
            translate(&renamed),
            vec![
                WatchEvent::removed(PathBuf::from("/m/old.mkv")),
                WatchEvent::added(PathBuf::from("/m/new.mkv")),
            ]
        );
    }

    #[test]
    fn content_change_counts_as_addition() {
        let written = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/m/a.mkv"],
        );
        assert_eq!(translate(&written), vec![WatchEvent::added(PathBuf::from("/m/a.mkv"))]);

        let touched = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)),
            &["/m/a.mkv"],
        );
        assert!(translate(&touched).is_empty());
    }
}
