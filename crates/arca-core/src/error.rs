//! Error types for arca-core

use std::path::PathBuf;

/// Result type for arca-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in arca-core operations
///
/// Nearly everything the engine encounters is captured inside reports as
/// issues or differences; these variants cover only the argument-phase
/// failures that abort a whole call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured backup root cannot be used at all.
    #[error("Invalid backup root '{root}': {reason}")]
    BackupRoot { root: String, reason: String },

    /// Configuration file could not be read.
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Filesystem error from arca-fs
    #[error(transparent)]
    Fs(#[from] arca_fs::Error),
}
