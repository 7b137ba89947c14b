use std::path::PathBuf;

use thiserror::Error;

/// Why a change notification produced no snapshot.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a regular file")]
    NotAFile { path: PathBuf },
}

impl CaptureError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            CaptureError::Read { path, .. } | CaptureError::NotAFile { path } => path,
        }
    }
}
