use std::path::PathBuf;

use anyhow::{Context, Result};
use shadow_core::Snapshot;

/// Destination for persisted snapshots. Only the persistence worker writes to it.
pub trait ShadowStore: Send + Sync {
    /// Make the store ready for writes, optionally discarding earlier contents.
    fn prepare(&self, purge: bool) -> Result<()>;
    /// Persist one snapshot, returning where it landed.
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf>;
}

#[derive(Clone, Debug)]
pub struct FsShadowStore {
    pub root: PathBuf,
}

impl FsShadowStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path_for(&self, snapshot: &Snapshot) -> PathBuf {
        self.root.join(snapshot.shadow_name())
    }
}

impl ShadowStore for FsShadowStore {
    fn prepare(&self, purge: bool) -> Result<()> {
        if purge && self.root.exists() {
            std::fs::remove_dir_all(&self.root)
                .with_context(|| format!("purge shadow dir {}", self.root.display()))?;
            tracing::info!(dir = %self.root.display(), "purged shadow directory");
        }
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create shadow dir {}", self.root.display()))?;
        Ok(())
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.path_for(snapshot);
        std::fs::write(&path, snapshot.contents())
            .with_context(|| format!("write snapshot {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prepare_creates_missing_dir() {
        let dir = tempdir().unwrap();
        let store = FsShadowStore::new(dir.path().join("shadow"));
        store.prepare(false).unwrap();
        assert!(store.root.is_dir());
    }

    #[test]
    fn prepare_without_purge_keeps_files() {
        let dir = tempdir().unwrap();
        let store = FsShadowStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("0_old.txt"), "old").unwrap();
        store.prepare(false).unwrap();
        assert!(dir.path().join("0_old.txt").exists());
    }

    #[test]
    fn prepare_with_purge_empties_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("shadow");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("0_stale.tmp"), "stale").unwrap();
        std::fs::write(root.join("nested").join("x"), "x").unwrap();

        let store = FsShadowStore::new(root.clone());
        store.prepare(true).unwrap();
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn writes_and_overwrites_snapshot() {
        let dir = tempdir().unwrap();
        let store = FsShadowStore::new(dir.path().to_path_buf());
        let first = store.write_snapshot(&Snapshot::new(0, "config.tmp", "a")).unwrap();
        assert_eq!(first, dir.path().join("0_config.tmp"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "a");

        store.write_snapshot(&Snapshot::new(0, "config.tmp", "replaced")).unwrap();
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "replaced");
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let store = FsShadowStore::new(dir.path().join("never-created"));
        let err = store.write_snapshot(&Snapshot::new(0, "a.txt", "a")).unwrap_err();
        assert!(format!("{err:#}").contains("0_a.txt"));
    }
}
