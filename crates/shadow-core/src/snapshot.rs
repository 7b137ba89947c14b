use std::path::Path;

use serde::{Deserialize, Serialize};

/// Contents of one file at one instant, tagged with its per-path sequence number.
///
/// Built by the capture side and handed to the persistence worker by value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    sequence: u64,
    file_name: String,
    contents: String,
}

impl Snapshot {
    pub fn new(sequence: u64, file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            sequence,
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Builds a snapshot named after the last component of `path`.
    pub fn for_path(sequence: u64, path: &Path, contents: impl Into<String>) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(sequence, file_name, contents)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Name of the file this snapshot is persisted under: `<sequence>_<file_name>`.
    pub fn shadow_name(&self) -> String {
        format!("{}_{}", self.sequence, self.file_name)
    }
}
