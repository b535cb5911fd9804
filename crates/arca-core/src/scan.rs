//! Path content scanning
//!
//! Resolves an application's path specs into a flat map of portable
//! relative keys, recording a typed issue for everything that cannot be
//! resolved or read. The same machinery scans a backup subtree with
//! base-relative keys, so both sides of a comparison draw keys from the
//! same space.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io;

use arca_fs::path::ends_with_separator;
use arca_fs::{FileMeta, NormalizedPath, SpecialFolders};
use walkdir::WalkDir;

use crate::report::{IssueKind, IssueSource, PathIssue};

/// A file found during scanning.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Concrete location the file was enumerated at
    pub path: NormalizedPath,
    /// Size and modification time
    pub meta: FileMeta,
}

/// Where one spec's content lives in key space.
///
/// Built once per scan and consumed by the engine's deletion phases to
/// decide which keys a missing or empty spec protects.
#[derive(Debug, Clone)]
pub struct SpecCoverage {
    /// The spec as configured
    pub spec: String,
    /// Whether the spec names a directory tree
    pub dir_form: bool,
    /// Portable form of the expansion; `None` when the spec is blank or
    /// unexpandable, in which case the row covers nothing
    pub zone: Option<String>,
    /// The concrete expansion
    pub expanded: Option<NormalizedPath>,
    /// Whether the spec produced no content: missing, unreadable or
    /// effectively empty
    pub missing_or_empty: bool,
}

impl SpecCoverage {
    /// Whether `key` falls inside this spec's zone.
    ///
    /// Keys produced under a spec can carry a deeper token than the
    /// spec's own zone (a tree spec whose subtree contains another
    /// special folder), so a failed prefix test falls back to comparing
    /// concrete paths.
    pub fn covers(&self, key: &str, folders: &SpecialFolders) -> bool {
        let Some(zone) = &self.zone else {
            return false;
        };
        if key_in_zone(zone, self.dir_form, key) {
            return true;
        }
        if let (Some(expanded), Some(path)) = (&self.expanded, folders.expand_key(key)) {
            let path = NormalizedPath::new(&path);
            return if self.dir_form {
                path.strip_prefix(expanded).is_some()
            } else {
                path == *expanded
            };
        }
        false
    }
}

fn key_in_zone(zone: &str, dir_form: bool, key: &str) -> bool {
    if dir_form {
        key == zone
            || key
                .strip_prefix(zone)
                .is_some_and(|rest| rest.starts_with('/'))
    } else {
        key == zone
    }
}

/// Result of scanning one side.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Relative key to file; first occurrence wins on key clashes
    pub files: BTreeMap<String, ScannedFile>,
    /// Problems encountered, in discovery order
    pub issues: Vec<PathIssue>,
    /// True when not a single file was collected
    pub effectively_empty: bool,
    /// One coverage row per spec, in spec order; empty for tree scans
    pub coverage: Vec<SpecCoverage>,
}

/// Scans path specs and backup subtrees into flat file listings.
pub struct Scanner<'a> {
    folders: &'a SpecialFolders,
}

impl<'a> Scanner<'a> {
    pub fn new(folders: &'a SpecialFolders) -> Self {
        Self { folders }
    }

    /// Scan configured path specs into portable keys.
    pub fn scan_specs(&self, specs: &[String], source: IssueSource) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for raw in specs {
            self.scan_spec(raw, source, &mut outcome);
        }
        outcome.effectively_empty = outcome.files.is_empty();
        outcome
    }

    /// Scan an existing backup subtree into base-relative keys.
    pub fn scan_tree(&self, base: &NormalizedPath, source: IssueSource) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        if !base.is_dir() {
            outcome.issues.push(PathIssue {
                path_spec: base.dir_form(),
                expanded_path: Some(base.as_str().to_string()),
                kind: IssueKind::NotFound,
                source,
                description: "backup directory does not exist".to_string(),
            });
            outcome.effectively_empty = true;
            return outcome;
        }

        let label = base.dir_form();
        collect_tree(base, &label, source, &mut outcome, |full| {
            full.strip_prefix(base).unwrap_or_default().to_string()
        });
        outcome.effectively_empty = outcome.files.is_empty();
        outcome
    }

    fn scan_spec(&self, raw: &str, source: IssueSource, outcome: &mut ScanOutcome) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            outcome.issues.push(PathIssue {
                path_spec: raw.to_string(),
                expanded_path: None,
                kind: IssueKind::BlankSpec,
                source,
                description: "path spec is blank".to_string(),
            });
            outcome.coverage.push(SpecCoverage {
                spec: raw.to_string(),
                dir_form: false,
                zone: None,
                expanded: None,
                missing_or_empty: true,
            });
            return;
        }

        let expanded = self.folders.expand(trimmed);
        if expanded.trim().is_empty() || self.folders.has_token(&expanded) {
            let description = if self.folders.has_token(&expanded) {
                format!("unresolved placeholder in '{expanded}'")
            } else {
                "spec expands to nothing".to_string()
            };
            outcome.issues.push(PathIssue {
                path_spec: raw.to_string(),
                expanded_path: None,
                kind: IssueKind::Unexpandable,
                source,
                description,
            });
            outcome.coverage.push(SpecCoverage {
                spec: raw.to_string(),
                dir_form: ends_with_separator(trimmed),
                zone: None,
                expanded: None,
                missing_or_empty: true,
            });
            return;
        }

        // Directory versus file is decided by the spec as written, not by
        // what happens to exist at the expansion.
        let dir_form = ends_with_separator(trimmed);
        let path = NormalizedPath::new(&expanded);
        let zone = self.folders.to_portable(path.as_str());
        let mut missing_or_empty = false;

        if dir_form {
            if !path.is_dir() {
                outcome.issues.push(PathIssue {
                    path_spec: raw.to_string(),
                    expanded_path: Some(path.as_str().to_string()),
                    kind: IssueKind::NotFound,
                    source,
                    description: "directory does not exist".to_string(),
                });
                missing_or_empty = true;
            } else {
                let seen = collect_tree(&path, raw, source, outcome, |full| {
                    self.folders.to_portable(full.as_str())
                });
                if seen == 0 {
                    outcome.issues.push(PathIssue {
                        path_spec: raw.to_string(),
                        expanded_path: Some(path.as_str().to_string()),
                        kind: IssueKind::EffectivelyEmpty,
                        source,
                        description: "directory contains no files".to_string(),
                    });
                    missing_or_empty = true;
                }
            }
        } else if !path.is_file() {
            outcome.issues.push(PathIssue {
                path_spec: raw.to_string(),
                expanded_path: Some(path.as_str().to_string()),
                kind: IssueKind::NotFound,
                source,
                description: "no file at this path".to_string(),
            });
            missing_or_empty = true;
        } else {
            match FileMeta::of(&path) {
                Ok(meta) => insert_first_wins(
                    outcome,
                    zone.clone(),
                    ScannedFile {
                        path: path.clone(),
                        meta,
                    },
                ),
                Err(e) => {
                    outcome.issues.push(PathIssue {
                        path_spec: raw.to_string(),
                        expanded_path: Some(path.as_str().to_string()),
                        kind: classify_io_kind(e.io_kind()),
                        source,
                        description: e.to_string(),
                    });
                    missing_or_empty = true;
                }
            }
        }

        outcome.coverage.push(SpecCoverage {
            spec: raw.to_string(),
            dir_form,
            zone: Some(zone),
            expanded: Some(path),
            missing_or_empty,
        });
    }
}

/// Walk a directory tree, inserting every regular file under a key
/// computed by `key_of`. Returns the number of regular files seen, which
/// may exceed the number inserted when keys clash or metadata fails.
/// In-walk failures are attributed to the failing entry's path, so only
/// the caller's missing-base marker ever carries the scan root's label.
fn collect_tree(
    base: &NormalizedPath,
    spec_label: &str,
    source: IssueSource,
    outcome: &mut ScanOutcome,
    mut key_of: impl FnMut(&NormalizedPath) -> String,
) -> usize {
    let mut seen = 0usize;
    for entry in WalkDir::new(base.to_native()).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let failing = e
                    .path()
                    .map(|p| NormalizedPath::new(p).as_str().to_string());
                outcome.issues.push(PathIssue {
                    path_spec: failing
                        .clone()
                        .unwrap_or_else(|| spec_label.to_string()),
                    expanded_path: failing,
                    kind: classify_io_kind(e.io_error().map(io::Error::kind)),
                    source,
                    description: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        seen += 1;

        let full = NormalizedPath::new(entry.path());
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                outcome.issues.push(PathIssue {
                    path_spec: full.as_str().to_string(),
                    expanded_path: Some(full.as_str().to_string()),
                    kind: classify_io_kind(e.io_error().map(io::Error::kind)),
                    source,
                    description: e.to_string(),
                });
                continue;
            }
        };
        let modified = match meta.modified() {
            Ok(m) => m,
            Err(e) => {
                outcome.issues.push(PathIssue {
                    path_spec: full.as_str().to_string(),
                    expanded_path: Some(full.as_str().to_string()),
                    kind: IssueKind::Inaccessible,
                    source,
                    description: e.to_string(),
                });
                continue;
            }
        };

        let key = key_of(&full);
        insert_first_wins(
            outcome,
            key,
            ScannedFile {
                path: full,
                meta: FileMeta {
                    len: meta.len(),
                    modified: modified.into(),
                },
            },
        );
    }
    seen
}

fn insert_first_wins(outcome: &mut ScanOutcome, key: String, file: ScannedFile) {
    match outcome.files.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(file);
        }
        Entry::Occupied(slot) => {
            tracing::debug!(
                "duplicate relative key '{}' from {}; keeping first occurrence",
                slot.key(),
                file.path
            );
        }
    }
}

fn classify_io_kind(kind: Option<io::ErrorKind>) -> IssueKind {
    match kind {
        Some(io::ErrorKind::NotFound) => IssueKind::NotFound,
        _ => IssueKind::Inaccessible,
    }
}
