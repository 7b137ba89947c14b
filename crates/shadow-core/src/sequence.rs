use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// Per-path version counter.
///
/// Each path's successor is computed and stored while its shard lock is held, so
/// overlapping notifications for the same path can never observe the same
/// predecessor.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last: DashMap<PathBuf, u64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns 0 for an unseen path, otherwise one more than the previous value.
    pub fn next_sequence(&self, path: &Path) -> u64 {
        let entry = self
            .last
            .entry(path.to_path_buf())
            .and_modify(|seq| *seq += 1)
            .or_insert(0);
        *entry
    }

    /// Last sequence handed out for `path`, if any.
    pub fn current(&self, path: &Path) -> Option<u64> {
        self.last.get(path).map(|v| *v)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
