//! Path normalization utilities
//!
//! All paths inside the crate use forward slashes regardless of platform.
//! Conversion back to the native representation happens only at the I/O
//! boundary via [`NormalizedPath::to_native`].

use std::fmt;
use std::path::{Path, PathBuf};

/// A path normalized to forward slashes.
///
/// Backslashes are converted, separator runs are collapsed (a leading `//`
/// is kept so UNC paths survive), `.` segments are dropped and trailing
/// separators are trimmed. `..` segments are preserved verbatim; nothing
/// here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalize a path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize(&path.as_ref().to_string_lossy()))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a native [`PathBuf`] for I/O.
    ///
    /// Forward slashes are accepted by every platform we target, so this
    /// is a plain conversion.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Append a relative segment.
    ///
    /// Leading separators on `other` are ignored so that portable keys can
    /// be joined directly under a base directory.
    pub fn join(&self, other: &str) -> Self {
        let tail = normalize(other);
        let tail = tail.trim_start_matches('/');
        if tail.is_empty() {
            return self.clone();
        }
        if self.0.is_empty() {
            return Self(tail.to_string());
        }
        if self.0.ends_with('/') {
            Self(format!("{}{}", self.0, tail))
        } else {
            Self(format!("{}/{}", self.0, tail))
        }
    }

    /// The parent path, or `None` at a root or single component.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.0.trim_end_matches('/');
        let idx = trimmed.rfind('/')?;
        if idx == 0 {
            return Some(Self("/".to_string()));
        }
        let parent = &trimmed[..idx];
        if parent.ends_with(':') {
            return Some(Self(format!("{parent}/")));
        }
        Some(Self(parent.to_string()))
    }

    /// The final component, or `None` at a root.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.0.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.ends_with(':') {
            return None;
        }
        match trimmed.rfind('/') {
            Some(idx) => Some(&trimmed[idx + 1..]),
            None => Some(trimmed),
        }
    }

    /// Strip `base` off the front, honouring component boundaries.
    ///
    /// Returns the remainder without a leading separator, or `None` when
    /// `base` is not an ancestor. Stripping a path from itself yields `""`.
    pub fn strip_prefix(&self, base: &NormalizedPath) -> Option<&str> {
        let base = base.0.trim_end_matches('/');
        let rest = self.0.strip_prefix(base)?;
        if rest.is_empty() {
            return Some(rest);
        }
        rest.strip_prefix('/')
    }

    /// Render with a single trailing separator, as used for directory
    /// destinations in reports.
    pub fn dir_form(&self) -> String {
        if self.0.ends_with('/') {
            self.0.clone()
        } else {
            format!("{}/", self.0)
        }
    }

    /// Whether the path exists on disk.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Whether the path is an existing regular file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Whether the path is an existing directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a raw path spec ends in a separator, marking it as a directory
/// spec rather than a single-file spec.
pub fn ends_with_separator(spec: &str) -> bool {
    spec.ends_with('/') || spec.ends_with('\\')
}

fn normalize(raw: &str) -> String {
    let swapped = raw.replace('\\', "/");
    let unc = swapped.starts_with("//") && !swapped[2..].starts_with('/');

    let mut out = String::with_capacity(swapped.len());
    if swapped.starts_with('/') {
        out.push('/');
        if unc {
            out.push('/');
        }
    }
    let mut first = true;
    for seg in swapped.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if !first {
            out.push('/');
        }
        out.push_str(seg);
        first = false;
    }

    if out.is_empty() && !swapped.is_empty() {
        // A bare "." or separator-only input still names something.
        if swapped.starts_with('/') {
            return if unc { "//".to_string() } else { "/".to_string() };
        }
        return ".".to_string();
    }

    // "C:" alone is drive-relative on Windows; keep roots in "C:/" form.
    if is_drive_only(&out) {
        out.push('/');
    }
    out
}

fn is_drive_only(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
