use std::sync::Arc;
use std::thread::{self, JoinHandle};

use shadow_core::{is_binary_like, Snapshot};
use shadow_queue::{CancellationToken, SnapshotQueue};
use shadow_store::ShadowStore;

/// Counters reported when the worker exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub persisted: u64,
    pub write_failures: u64,
    pub suppressed_displays: u64,
}

/// Sole consumer of the snapshot queue and sole writer of the shadow store.
pub struct PersistenceWorker {
    queue: SnapshotQueue,
    store: Arc<dyn ShadowStore>,
    suppress_binary_display: bool,
}

impl PersistenceWorker {
    pub fn new(queue: SnapshotQueue, store: Arc<dyn ShadowStore>, suppress_binary_display: bool) -> Self {
        Self {
            queue,
            store,
            suppress_binary_display,
        }
    }

    /// Run [`run`](Self::run) on a dedicated thread.
    pub fn spawn(self, token: CancellationToken) -> std::io::Result<JoinHandle<WorkerStats>> {
        thread::Builder::new()
            .name("shadow-persist".to_string())
            .spawn(move || self.run(&token))
    }

    /// Persist snapshots until `token` is cancelled and the queue is empty.
    pub fn run(&self, token: &CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Ok(snapshot) = self.queue.wait_and_dequeue(token) {
            self.persist(&snapshot, &mut stats);
        }
        tracing::debug!(?stats, "persistence worker exiting");
        stats
    }

    /// Log one snapshot and write it. Write failures are logged and dropped.
    pub fn persist(&self, snapshot: &Snapshot, stats: &mut WorkerStats) {
        let seq = snapshot.sequence();
        let file = snapshot.file_name();

        if self.suppress_binary_display && is_binary_like(snapshot.contents()) {
            stats.suppressed_displays += 1;
            tracing::warn!(target: "shadow::data", seq, file, "skipped binary file");
        } else {
            tracing::warn!(target: "shadow::data", seq, file, "{}", snapshot.contents());
        }

        match self.store.write_snapshot(snapshot) {
            Ok(path) => {
                stats.persisted += 1;
                tracing::debug!(seq, path = %path.display(), "snapshot persisted");
            }
            Err(err) => {
                stats.write_failures += 1;
                tracing::error!(seq, file, error = %format!("{err:#}"), "failed to persist snapshot");
            }
        }
    }
}
