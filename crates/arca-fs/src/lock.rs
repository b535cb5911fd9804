//! Advisory locking of the backup root

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};
use crate::path::NormalizedPath;

/// Name of the lock file kept directly under the backup root.
pub const LOCK_FILE_NAME: &str = ".arca.lock";

/// Exclusive advisory lock over a backup root.
///
/// Held for the duration of a batch so two processes do not mutate the
/// same root at once. Dropping the guard releases the lock.
#[derive(Debug)]
pub struct RootLock {
    file: File,
    path: PathBuf,
}

impl RootLock {
    /// Acquire the lock, failing immediately when another process holds it.
    ///
    /// The backup root is created when missing; the lock file lives
    /// directly under it.
    pub fn acquire(root: &NormalizedPath) -> Result<Self> {
        let root_native = root.to_native();
        std::fs::create_dir_all(&root_native).map_err(|e| Error::io(&root_native, e))?;

        let path = root.join(LOCK_FILE_NAME).to_native();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.try_lock_exclusive().map_err(|e| {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                Error::LockHeld { path: path.clone() }
            } else {
                Error::io(&path, e)
            }
        })?;

        Ok(Self { file, path })
    }

    /// Location of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
