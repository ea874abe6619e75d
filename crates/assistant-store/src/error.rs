use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The document was never initialized. Seeing this means a caller skipped
    /// `ensure_initialized`, not that the disk is in a bad state.
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt document {}: {source}", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::CorruptData {
            path: path.into(),
            source,
        }
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
