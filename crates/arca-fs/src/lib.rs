//! Filesystem layer for arca
//!
//! Portable path handling, special folder resolution, file metadata
//! comparison and retryable I/O. Everything above this crate works with
//! [`NormalizedPath`] and portable keys; native paths exist only at the
//! I/O boundary.

pub mod error;
pub mod folders;
pub mod lock;
pub mod meta;
pub mod path;
pub mod retry;

pub use error::{Error, Result};
pub use folders::{FolderEntry, SpecialFolders};
pub use lock::{LOCK_FILE_NAME, RootLock};
pub use meta::{FileMeta, MODIFY_WINDOW_MS};
pub use path::NormalizedPath;
