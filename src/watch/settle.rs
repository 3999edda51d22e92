use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Tracks new files until they stop changing.
///
/// A file is reported once no change has been seen for the settle duration,
/// so a copy in progress is not indexed half-written.
#[derive(Debug)]
pub struct FileSettleTracker {
    /// Path to last time a change was seen
    pending: HashMap<PathBuf, Instant>,
    settle_duration: Duration,
}

impl FileSettleTracker {
    pub fn new(settle_duration: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            settle_duration,
        }
    }

    pub fn settle_duration(&self) -> Duration {
        self.settle_duration
    }

    /// Record a change, restarting the file's settle timer.
    pub fn file_changed(&mut self, path: PathBuf) {
        self.file_changed_at(path, Instant::now());
    }

    pub fn file_changed_at(&mut self, path: PathBuf, at: Instant) {
        self.pending.insert(path, at);
    }

    /// Stop tracking a file, e.g. because it was deleted before settling.
    /// Returns whether it was pending.
    pub fn cancel(&mut self, path: &Path) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Remove and return every file that has been quiet long enough.
    pub fn take_settled(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut settled = Vec::new();
        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.settle_duration {
                settled.push(path.clone());
                false
            } else {
                true
            }
        });
        settled.sort();
        settled
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_after_quiet_period() {
        let start = Instant::now();
        let mut tracker = FileSettleTracker::new(Duration::from_secs(30));
        tracker.file_changed_at(PathBuf::from("/m/a.mkv"), start);

        assert!(tracker.take_settled(start + Duration::from_secs(10)).is_empty());
        assert_eq!(
            tracker.take_settled(start + Duration::from_secs(30)),
            vec![PathBuf::from("/m/a.mkv")]
        );
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn change_restarts_timer() {
        let start = Instant::now();
        let mut tracker = FileSettleTracker::new(Duration::from_secs(30));
        tracker.file_changed_at(PathBuf::from("/m/a.mkv"), start);
        tracker.file_changed_at(PathBuf::from("/m/a.mkv"), start + Duration::from_secs(20));

        assert!(tracker.take_settled(start + Duration::from_secs(40)).is_empty());
        assert_eq!(tracker.take_settled(start + Duration::from_secs(50)).len(), 1);
    }

    #[test]
    fn cancel_drops_pending_file() {
        let start = Instant::now();
        let mut tracker = FileSettleTracker::new(Duration::ZERO);
        tracker.file_changed_at(PathBuf::from("/m/a.mkv"), start);

        assert!(tracker.cancel(Path::new("/m/a.mkv")));
        assert!(!tracker.cancel(Path::new("/m/a.mkv")));
        assert!(tracker.take_settled(start).is_empty());
    }
}
