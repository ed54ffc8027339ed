//! Error types for flowlog-store.

use std::path::PathBuf;

/// Result type for flowlog-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in flowlog-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stats file could not be opened.
    #[error("Error opening stats file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create the directory holding the stats file.
    #[error("Failed to create data directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a record failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the stats file itself could not be opened.
    pub fn is_file_open(&self) -> bool {
        matches!(self, Self::FileOpen { .. } | Self::CreateDirectory { .. })
    }
}
