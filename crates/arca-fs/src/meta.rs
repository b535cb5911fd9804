//! File metadata and the content equality rule
//!
//! Backup comparison never reads file contents. Two files count as equal
//! when their sizes match and their modification times fall within a small
//! tolerance window.

use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::NormalizedPath;

/// Modification times within this window count as equal.
///
/// FAT and several network filesystems round timestamps to two second
/// granularity, so exact comparison would flag every file after a copy
/// across such a boundary.
pub const MODIFY_WINDOW_MS: i64 = 2_000;

/// Size and modification time of a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub len: u64,
    pub modified: DateTime<Utc>,
}

impl FileMeta {
    /// Read the metadata of an existing file.
    pub fn of(path: &NormalizedPath) -> Result<Self> {
        let native = path.to_native();
        let meta = fs::metadata(&native).map_err(|e| Error::io(&native, e))?;
        let modified = meta.modified().map_err(|e| Error::io(&native, e))?;
        Ok(Self {
            len: meta.len(),
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Whether another file counts as the same content.
    pub fn matches(&self, other: &FileMeta) -> bool {
        self.len == other.len && within_modify_window(self.modified, other.modified)
    }
}

/// Whether two timestamps fall within [`MODIFY_WINDOW_MS`] of each other.
pub fn within_modify_window(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).num_milliseconds().abs() <= MODIFY_WINDOW_MS
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use tempfile::TempDir;

    use super::*;

    fn at(base: DateTime<Utc>, offset_ms: i64) -> DateTime<Utc> {
        base + TimeDelta::milliseconds(offset_ms)
    }

    #[test]
    fn test_matches_within_window() {
        let now = Utc::now();
        let a = FileMeta { len: 10, modified: now };

        for offset in [-2_000, -1_999, 0, 500, 2_000] {
            let b = FileMeta { len: 10, modified: at(now, offset) };
            assert!(a.matches(&b), "offset {offset}ms should match");
        }
        for offset in [-2_001, 2_001, 60_000] {
            let b = FileMeta { len: 10, modified: at(now, offset) };
            assert!(!a.matches(&b), "offset {offset}ms should not match");
        }
    }

    #[test]
    fn test_size_mismatch_never_matches() {
        let now = Utc::now();
        let a = FileMeta { len: 10, modified: now };
        let b = FileMeta { len: 11, modified: now };
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_of_reads_len_and_mtime() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        std::fs::write(&file, b"hello").unwrap();

        let stamp = filetime::FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(&file, stamp).unwrap();

        let meta = FileMeta::of(&NormalizedPath::new(&file)).unwrap();
        assert_eq!(meta.len, 5);
        assert_eq!(meta.modified.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_of_missing_file_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let missing = NormalizedPath::new(temp.path().join("absent"));
        let err = FileMeta::of(&missing).unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }
}
