//! [`Sandbox`] fixture for backup and restore test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use arca_fs::{NormalizedPath, SpecialFolders};
use filetime::FileTime;
use tempfile::TempDir;

/// A temporary directory laid out like a small machine: live special
/// folders, a backup root and a [`SpecialFolders`] table scoped to it, so
/// tests never touch the real system folders.
///
/// # Example
///
/// ```rust,no_run
/// use arca_test_utils::Sandbox;
///
/// let sandbox = Sandbox::new();
/// sandbox.write_live("docs/notes.txt", b"hello");
/// sandbox.assert_live_exists("docs/notes.txt");
/// ```
pub struct Sandbox {
    temp: TempDir,
    folders: SpecialFolders,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create the layout with `%Documents%` and `%AppData%` live folders
    /// already present. The backup root exists only as a reserved path
    /// until something writes to it.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("live/docs");
        let appdata = temp.path().join("live/appdata");
        fs::create_dir_all(&docs).unwrap();
        fs::create_dir_all(&appdata).unwrap();
        let folders =
            SpecialFolders::from_pairs([("%Documents%", docs), ("%AppData%", appdata)]);
        Self { temp, folders }
    }

    /// Root of the whole sandbox.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// The token table scoped to this sandbox.
    pub fn folders(&self) -> &SpecialFolders {
        &self.folders
    }

    /// Backup root location inside the sandbox.
    pub fn backup_root(&self) -> PathBuf {
        self.temp.path().join("backup")
    }

    /// Backup root in the form a config file would carry.
    pub fn backup_root_spec(&self) -> String {
        NormalizedPath::new(self.backup_root()).as_str().to_string()
    }

    /// Absolute path of `rel` inside the live area.
    pub fn live_path(&self, rel: &str) -> PathBuf {
        self.temp.path().join("live").join(rel)
    }

    /// Absolute path of one backed-up entry.
    pub fn backup_path(&self, app_id: &str, key: &str) -> PathBuf {
        self.backup_root().join(app_id).join(key)
    }

    /// Write a file under the live area, creating parent directories.
    pub fn write_live(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.live_path(rel);
        write_file(&path, contents);
        path
    }

    /// Write a backed-up entry as the engine would lay it out, creating
    /// parent directories.
    pub fn write_backup(&self, app_id: &str, key: &str, contents: &[u8]) -> PathBuf {
        let path = self.backup_path(app_id, key);
        write_file(&path, contents);
        path
    }

    /// Read a live file to a string.
    ///
    /// # Panics
    /// Panics if the file is missing or not UTF-8.
    pub fn read_live(&self, rel: &str) -> String {
        read_file(&self.live_path(rel))
    }

    /// Read a backed-up entry to a string.
    ///
    /// # Panics
    /// Panics if the entry is missing or not UTF-8.
    pub fn read_backup(&self, app_id: &str, key: &str) -> String {
        read_file(&self.backup_path(app_id, key))
    }

    /// Assert that `rel` exists under the live area.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_live_exists(&self, rel: &str) {
        let path = self.live_path(rel);
        assert!(path.exists(), "expected live file to exist: {}", path.display());
    }

    /// Assert that `rel` does **not** exist under the live area.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_live_missing(&self, rel: &str) {
        let path = self.live_path(rel);
        assert!(!path.exists(), "expected live file to be absent: {}", path.display());
    }

    /// Assert that a backed-up entry exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the entry does not exist.
    pub fn assert_backup_exists(&self, app_id: &str, key: &str) {
        let path = self.backup_path(app_id, key);
        assert!(path.exists(), "expected backup entry to exist: {}", path.display());
    }

    /// Assert that a backed-up entry does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the entry exists.
    pub fn assert_backup_missing(&self, app_id: &str, key: &str) {
        let path = self.backup_path(app_id, key);
        assert!(!path.exists(), "expected backup entry to be absent: {}", path.display());
    }
}

/// Stamp a fixed modification time on `path` so metadata comparisons in
/// tests are deterministic.
pub fn set_mtime(path: &Path, unix_secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
