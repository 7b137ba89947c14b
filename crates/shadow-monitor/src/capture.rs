use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shadow_core::{CaptureError, SequenceTracker, Snapshot};
use shadow_queue::SnapshotQueue;

use crate::{FilePattern, WatchEvent};

/// Turns change notifications into queued snapshots.
///
/// Safe to call from any number of dispatch threads at once; the only shared
/// state is the tracker and the queue, both of which synchronize internally.
pub struct CaptureHandler {
    tracker: Arc<SequenceTracker>,
    queue: SnapshotQueue,
    pattern: FilePattern,
    warn_threshold: usize,
    backlog_warned: AtomicBool,
}

impl CaptureHandler {
    pub fn new(tracker: Arc<SequenceTracker>, queue: SnapshotQueue, pattern: FilePattern) -> Self {
        Self {
            tracker,
            queue,
            pattern,
            warn_threshold: crate::DEFAULT_QUEUE_WARN_THRESHOLD,
            backlog_warned: AtomicBool::new(false),
        }
    }

    pub fn with_warn_threshold(mut self, threshold: usize) -> Self {
        self.warn_threshold = threshold.max(1);
        self
    }

    /// Entry point for the event source. Never panics on I/O failure.
    pub fn handle(&self, event: WatchEvent) {
        match event {
            WatchEvent::Changed(path) => {
                if self.pattern.matches(&path) && !path.is_dir() {
                    self.on_changed(&path);
                }
            }
            WatchEvent::Created(path) => {
                if self.pattern.matches(&path) {
                    tracing::info!(path = %path.display(), "created");
                }
            }
            WatchEvent::Deleted(path) => {
                if self.pattern.matches(&path) {
                    tracing::info!(path = %path.display(), "deleted");
                }
            }
            WatchEvent::Renamed { from, to } => {
                if self.pattern.matches(&from) || self.pattern.matches(&to) {
                    tracing::info!(from = %from.display(), to = %to.display(), "renamed");
                }
            }
        }
    }

    fn on_changed(&self, path: &Path) {
        match self.capture(path) {
            Ok(snapshot) => self.enqueue(snapshot),
            Err(err) => tracing::error!(path = %err.path().display(), error = %err, "capture failed"),
        }
    }

    /// Read `path` and stamp it with the next sequence number.
    ///
    /// The sequence is taken only after the read succeeded, so a failed capture
    /// leaves the tracker untouched.
    pub fn capture(&self, path: &Path) -> Result<Snapshot, CaptureError> {
        let contents = read_shared(path)?;
        let sequence = self.tracker.next_sequence(path);
        Ok(Snapshot::for_path(sequence, path, contents))
    }

    fn enqueue(&self, snapshot: Snapshot) {
        let seq = snapshot.sequence();
        let pending = self.queue.enqueue(snapshot);
        tracing::debug!(seq, pending, "snapshot queued");

        if pending >= self.warn_threshold {
            if !self.backlog_warned.swap(true, Ordering::Relaxed) {
                tracing::warn!(pending, threshold = self.warn_threshold, "persistence is falling behind");
            }
        } else if pending < self.warn_threshold / 2 {
            self.backlog_warned.store(false, Ordering::Relaxed);
        }
    }
}

/// Read the whole file as text without locking out concurrent writers.
fn read_shared(path: &Path) -> Result<String, CaptureError> {
    let read_err = |source| CaptureError::Read { path: path.to_path_buf(), source };

    let mut file = open_shared(path).map_err(read_err)?;
    if !file.metadata().map_err(read_err)?.is_file() {
        return Err(CaptureError::NotAFile { path: path.to_path_buf() });
    }
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(windows)]
fn open_shared(path: &Path) -> std::io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_SHARE_READ: u32 = 0x1;
    const FILE_SHARE_WRITE: u32 = 0x2;
    const FILE_SHARE_DELETE: u32 = 0x4;

    std::fs::OpenOptions::new()
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .open(path)
}

// Unix opens never take mandatory locks.
#[cfg(not(windows))]
fn open_shared(path: &Path) -> std::io::Result<File> {
    File::open(path)
}
