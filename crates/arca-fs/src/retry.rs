//! Retryable file operations
//!
//! Copies and deletes go through a linear backoff policy so that short
//! lived conditions like sharing violations or antivirus scans do not fail
//! a whole backup pass. Missing paths and denied access are permanent and
//! fail on the first attempt.

use std::fs;
use std::io;
use std::time::Duration;

use backoff::backoff::Backoff;
use filetime::FileTime;

use crate::error::{Error, Result};
use crate::path::NormalizedPath;

/// Total attempts per operation, including the first.
pub const RETRY_ATTEMPTS: u32 = 5;

/// Base delay between attempts; attempt `n` waits `n` times this.
pub const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Linear backoff: the wait grows by a fixed step after each failure.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl LinearBackoff {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            base,
            max_attempts,
            attempt: 0,
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(RETRY_ATTEMPTS, RETRY_DELAY)
    }
}

impl Backoff for LinearBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            None
        } else {
            Some(self.base * self.attempt)
        }
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Copy `src` to `dst`, creating parent directories and carrying the
/// source modification time over so later comparisons see the copy as
/// unchanged.
pub fn copy_file(src: &NormalizedPath, dst: &NormalizedPath) -> Result<u64> {
    let src_native = src.to_native();
    let dst_native = dst.to_native();
    with_retry(dst, || {
        if let Some(parent) = dst_native.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(&src_native, &dst_native)?;
        let meta = fs::metadata(&src_native)?;
        filetime::set_file_mtime(&dst_native, FileTime::from_last_modification_time(&meta))?;
        Ok(bytes)
    })
}

/// Delete a file.
pub fn remove_file(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    with_retry(path, || fs::remove_file(&native))
}

/// Create a directory and any missing ancestors.
pub fn create_dir_all(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    with_retry(path, || fs::create_dir_all(&native))
}

fn with_retry<T>(context: &NormalizedPath, mut op: impl FnMut() -> io::Result<T>) -> Result<T> {
    let result = backoff::retry_notify(
        LinearBackoff::default(),
        || op().map_err(classify),
        |err, delay| {
            tracing::debug!(
                "transient I/O failure at {}, retrying in {:?}: {}",
                context.as_str(),
                delay,
                err
            );
        },
    );
    result.map_err(|e| Error::io(context.to_native(), flatten(e)))
}

/// Missing paths and denied access never heal within a retry window.
fn classify(err: io::Error) -> backoff::Error<io::Error> {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            backoff::Error::permanent(err)
        }
        _ => backoff::Error::transient(err),
    }
}

fn flatten(err: backoff::Error<io::Error>) -> io::Error {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}
