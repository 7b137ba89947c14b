#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shadow_core::Snapshot;
use shadow_store::ShadowStore;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink for `tracing` output produced on the current thread.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber that records everything it logs on this thread.
pub fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buf = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buf.contents())
}

/// Store that remembers the order snapshots arrive in.
#[derive(Default)]
pub struct RecordingStore {
    pub written: Mutex<Vec<Snapshot>>,
}

impl ShadowStore for RecordingStore {
    fn prepare(&self, _purge: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> anyhow::Result<PathBuf> {
        self.written.lock().unwrap().push(snapshot.clone());
        Ok(PathBuf::from(snapshot.shadow_name()))
    }
}

/// Sorted file names directly inside `dir`.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
