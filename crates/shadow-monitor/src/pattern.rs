use std::path::Path;

use anyhow::{Context, Result};

/// File-name filter applied to every notification.
///
/// `*` and `*.*` accept every name, extension or not.
#[derive(Clone, Debug)]
pub struct FilePattern {
    pattern: Option<glob::Pattern>,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = match pattern.trim() {
            "" | "*" | "*.*" => None,
            p => Some(glob::Pattern::new(p).with_context(|| format!("invalid file pattern {p:?}"))?),
        };
        Ok(Self { pattern })
    }

    pub fn any() -> Self {
        Self { pattern: None }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        match &self.pattern {
            None => true,
            Some(p) => p.matches(&name.to_string_lossy()),
        }
    }
}
