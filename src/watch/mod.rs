//! Incremental catalog sync.
//!
//! A [`SyncWatcher`] consumes [`WatchEvent`]s (from [`FsEventSource`] or any
//! other producer), routes each to the folder that contains it and applies
//! it on that folder's worker. Events for one folder are applied one at a
//! time in arrival order under the folder lock shared with full scans;
//! different folders proceed in parallel.

pub mod settle;
mod source;
mod sync;

pub use settle::FileSettleTracker;
pub use source::{translate, FsEventSource};
pub use sync::WatchOutcome;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use homestream_common::{paths::has_media_extension, FolderId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Folder;
use crate::scanner::LibraryScanner;
use crate::subtitles::SubtitleCache;

/// Capacity of the inbound event channel.
pub const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Added,
    Removed,
}

/// A file appeared in or disappeared from a watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Added,
            path: path.into(),
        }
    }

    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Removed,
            path: path.into(),
        }
    }
}

/// Applies filesystem events to the catalog.
pub struct SyncWatcher {
    scanner: Arc<LibraryScanner>,
    folders: Vec<Folder>,
    subtitles: Arc<dyn SubtitleCache>,
}

impl SyncWatcher {
    pub fn new(
        scanner: Arc<LibraryScanner>,
        folders: Vec<Folder>,
        subtitles: Arc<dyn SubtitleCache>,
    ) -> Self {
        Self {
            scanner,
            folders,
            subtitles,
        }
    }

    /// The configured folder containing `path`; the deepest one wins when
    /// folders nest.
    pub fn folder_for(&self, path: &Path) -> Option<&Folder> {
        self.folders
            .iter()
            .filter(|folder| path.starts_with(&folder.path))
            .max_by_key(|folder| folder.path.components().count())
    }

    /// Start the dispatcher and return a handle for feeding it events.
    pub fn spawn(self) -> WatcherHandle {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(Arc::new(self).dispatch(receiver));
        WatcherHandle { sender, task }
    }

    async fn dispatch(self: Arc<Self>, mut receiver: mpsc::Receiver<WatchEvent>) {
        let mut workers: HashMap<FolderId, mpsc::UnboundedSender<WatchEvent>> = HashMap::new();
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        while let Some(event) = receiver.recv().await {
            // Same extension filter as full scans.
            if !has_media_extension(&event.path, self.scanner.extensions()) {
                continue;
            }
            let Some(folder) = self.folder_for(&event.path).cloned() else {
                debug!(path = ?event.path, "Event outside every folder");
                continue;
            };

            let worker = workers.entry(folder.id).or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                tasks.push(tokio::spawn(self.clone().run_worker(folder.clone(), rx)));
                tx
            });
            if worker.send(event).is_err() {
                warn!(folder = %folder.id, "Folder worker stopped");
            }
        }

        // Closing the queues lets each worker drain and exit.
        drop(workers);
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Folder worker panicked");
            }
        }
        info!("Sync watcher stopped");
    }

    async fn run_worker(
        self: Arc<Self>,
        folder: Folder,
        mut queue: mpsc::UnboundedReceiver<WatchEvent>,
    ) {
        debug!(folder = %folder.id, "Started folder worker");
        while let Some(event) = queue.recv().await {
            let _guard = self.scanner.locks().lock(folder.id).await;
            let outcome = self.apply(&folder, &event).await;
            info!(
                folder = %folder.id,
                kind = ?event.kind,
                outcome = ?outcome,
                "Applied watch event: {:?}",
                event.path
            );
        }
    }
}

/// Handle to a running [`SyncWatcher`].
pub struct WatcherHandle {
    sender: mpsc::Sender<WatchEvent>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// A sender for event producers such as [`FsEventSource`].
    pub fn sender(&self) -> mpsc::Sender<WatchEvent> {
        self.sender.clone()
    }

    pub async fn send(&self, event: WatchEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .context("Sync watcher is no longer running")
    }

    /// Stop accepting events and wait for every queued event to be applied.
    ///
    /// Senders handed out by [`sender`](Self::sender) must be dropped first.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.task.await.context("Sync watcher task failed")
    }
}
