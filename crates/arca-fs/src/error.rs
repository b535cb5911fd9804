//! Error types for filesystem operations

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for filesystem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the filesystem layer.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed, including after retries were exhausted.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backup root is already locked by another process.
    #[error("backup root is locked by another process: {path}")]
    LockHeld { path: PathBuf },
}

impl Error {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying I/O error kind, when this error wraps one.
    ///
    /// Callers use this to tell missing paths apart from access problems
    /// without unpacking the variant.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::LockHeld { .. } => None,
        }
    }
}
