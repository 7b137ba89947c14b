use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, bail, Context, Result};
use parking_lot::RwLock;
use shadow_core::SequenceTracker;
use shadow_queue::{CancellationToken, SnapshotQueue};
use shadow_store::{FsShadowStore, ShadowStore};

use crate::{CaptureHandler, EventSink, EventSource, MonitorConfig, PersistenceWorker, WatchEvent, WorkerStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Owns one watch: the event source, the capture side and the persistence worker.
///
/// A monitor runs at most once; after [`shutdown`](Self::shutdown) a new
/// instance is needed.
pub struct Monitor<S: EventSource> {
    config: MonitorConfig,
    source: S,
    store: Arc<dyn ShadowStore>,
    tracker: Arc<SequenceTracker>,
    queue: SnapshotQueue,
    /// External stop signal; only `run_until_cancelled` waits on it.
    token: CancellationToken,
    /// Private to the persistence worker, cancelled by `shutdown` once dispatch is closed.
    worker_token: CancellationToken,
    /// Held shared by every in-flight dispatch; shutdown takes it exclusively to close admission.
    admitting: Arc<RwLock<bool>>,
    worker: Option<JoinHandle<WorkerStats>>,
    state: MonitorState,
}

impl<S: EventSource> Monitor<S> {
    pub fn new(config: MonitorConfig, source: S, token: CancellationToken) -> Result<Self> {
        let store = Arc::new(FsShadowStore::new(config.shadow_dir.clone()));
        Self::with_store(config, source, store, token)
    }

    pub fn with_store(
        config: MonitorConfig,
        source: S,
        store: Arc<dyn ShadowStore>,
        token: CancellationToken,
    ) -> Result<Self> {
        config.file_pattern()?;
        Ok(Self {
            config,
            source,
            store,
            tracker: Arc::new(SequenceTracker::new()),
            queue: SnapshotQueue::new(),
            token,
            worker_token: CancellationToken::new(),
            admitting: Arc::new(RwLock::new(false)),
            worker: None,
            state: MonitorState::Created,
        })
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn shadow_dir(&self) -> &Path {
        &self.config.shadow_dir
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Prepare the shadow directory, start the worker, then open dispatch.
    pub fn start(&mut self) -> Result<()> {
        if self.state != MonitorState::Created {
            bail!("monitor cannot be started from state {:?}", self.state);
        }
        self.store.prepare(self.config.purge_shadow)?;

        let worker = PersistenceWorker::new(
            self.queue.clone(),
            self.store.clone(),
            self.config.suppress_binary_display,
        );
        self.worker = Some(worker.spawn(self.worker_token.clone()).context("spawn persistence worker")?);
        self.state = MonitorState::Running;

        let handler = CaptureHandler::new(self.tracker.clone(), self.queue.clone(), self.config.file_pattern()?)
            .with_warn_threshold(self.config.queue_warn_threshold);
        let admitting = self.admitting.clone();
        let sink: EventSink = Arc::new(move |event: WatchEvent| {
            let open = admitting.read();
            if *open {
                handler.handle(event);
            }
        });

        *self.admitting.write() = true;
        if let Err(err) = self.source.start(&self.config.monitor_dir, sink) {
            if let Err(stop_err) = self.shutdown() {
                tracing::error!(error = %stop_err, "monitor shutdown failed");
            }
            return Err(err);
        }

        tracing::info!(
            monitor = %self.config.monitor_dir.display(),
            shadow = %self.config.shadow_dir.display(),
            pattern = %self.config.file_pattern,
            "monitoring started"
        );
        Ok(())
    }

    /// Start if needed, block until the token is cancelled, then shut down.
    pub fn run_until_cancelled(&mut self) -> Result<WorkerStats> {
        if self.state == MonitorState::Created {
            self.start()?;
        }
        self.token.wait();
        self.shutdown()
    }

    /// Close dispatch, cancel the worker and join it.
    ///
    /// Snapshots already queued are persisted before the worker exits. The
    /// external token plays no part here, so raising it never stops the worker
    /// while captures can still be admitted.
    pub fn shutdown(&mut self) -> Result<WorkerStats> {
        match self.state {
            MonitorState::Created => {
                self.state = MonitorState::Stopped;
                return Ok(WorkerStats::default());
            }
            MonitorState::Stopped => return Ok(WorkerStats::default()),
            MonitorState::Running | MonitorState::Stopping => {}
        }
        self.state = MonitorState::Stopping;

        // waits out any capture still running inside the sink
        *self.admitting.write() = false;
        self.source.stop();
        self.worker_token.cancel();

        let joined = match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| anyhow!("persistence worker panicked")),
            None => Ok(WorkerStats::default()),
        };
        self.state = MonitorState::Stopped;
        let stats = joined?;
        tracing::info!(
            persisted = stats.persisted,
            write_failures = stats.write_failures,
            suppressed = stats.suppressed_displays,
            "monitoring stopped"
        );
        Ok(stats)
    }
}

impl<S: EventSource> Drop for Monitor<S> {
    fn drop(&mut self) {
        if matches!(self.state, MonitorState::Running | MonitorState::Stopping) {
            if let Err(err) = self.shutdown() {
                tracing::error!(error = %err, "monitor shutdown failed");
            }
        }
    }
}
