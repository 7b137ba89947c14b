//! Directory-change notifications and the sources that produce them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    Changed(PathBuf),
}

/// Callback that receives events. Sources may call it from several threads at once.
pub type EventSink = Arc<dyn Fn(WatchEvent) + Send + Sync>;

pub trait EventSource: Send {
    /// Begin delivering events for the direct children of `root` to `sink`.
    fn start(&mut self, root: &Path, sink: EventSink) -> Result<()>;
    /// Stop delivery. No new sink calls start after this returns.
    fn stop(&mut self);
}

/// Non-recursive OS watch backed by `notify`.
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for NotifySource {
    fn start(&mut self, root: &Path, sink: EventSink) -> Result<()> {
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if let Some(ev) = translate(event) {
                        sink(ev);
                    }
                }
                Err(err) => tracing::error!(error = %err, "directory watch error"),
            },
            notify::Config::default(),
        )
        .context("create directory watcher")?;
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .with_context(|| format!("watch {}", root.display()))?;
        self.watcher = Some(watcher);
        Ok(())
    }

    fn stop(&mut self) {
        // dropping the watcher tears down the OS watch
        self.watcher = None;
    }
}

/// Map a raw `notify` event onto the four kinds the monitor cares about.
///
/// inotify reports a rename inside the watched directory three times: the
/// `From` half, the `To` half, then a paired `Both`. Each is translated on its
/// own, so one rename logs as deleted, created and renamed. The halves are not
/// dropped because a move out of (or into) the directory only ever produces a
/// single half, and that half is the only record of the file leaving (or
/// arriving).
pub fn translate(event: notify::Event) -> Option<WatchEvent> {
    let mut paths = event.paths.into_iter();
    let first = paths.next()?;
    match event.kind {
        EventKind::Create(_) => Some(WatchEvent::Created(first)),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(first)),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match paths.next() {
            Some(to) => Some(WatchEvent::Renamed { from: first, to }),
            None => Some(WatchEvent::Created(first)),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(WatchEvent::Deleted(first)),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(WatchEvent::Created(first)),
        // backends that cannot pair rename halves report a bare name change
        EventKind::Modify(ModifyKind::Name(_)) => {
            if first.exists() {
                Some(WatchEvent::Created(first))
            } else {
                Some(WatchEvent::Deleted(first))
            }
        }
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            Some(WatchEvent::Changed(first))
        }
        _ => None,
    }
}

/// Source driven by explicit [`emit`](ManualSource::emit) calls. Clones share state.
#[derive(Clone, Default)]
pub struct ManualSource {
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` on the calling thread. Returns false when not started.
    pub fn emit(&self, event: WatchEvent) -> bool {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.sink.lock().is_some()
    }
}

impl EventSource for ManualSource {
    fn start(&mut self, _root: &Path, sink: EventSink) -> Result<()> {
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.lock().take();
    }
}
