//! Per-application sync reports and status derivation
//!
//! Every engine operation produces one [`SyncReport`] per application.
//! Reports collect typed path issues and file differences while the
//! operation runs and derive a single authoritative [`SyncStatus`] when
//! finalized. Derivation is a pure function of report contents so a
//! report can always be re-evaluated after the fact.

use arca_fs::FileMeta;
use serde::{Deserialize, Serialize};

/// What kind of problem a path issue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// The configured spec was null, empty or whitespace
    BlankSpec,
    /// Expansion produced nothing usable or left an unknown `%Token%`
    Unexpandable,
    /// The resolved path does not exist
    NotFound,
    /// The resolved path exists but could not be read
    Inaccessible,
    /// A directory spec resolved to a tree with no files in it
    EffectivelyEmpty,
    /// A destructive step was skipped to protect existing data
    OperationPrevented,
    /// An operation failed after retries were exhausted
    OperationFailed,
}

/// Which side of the comparison an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSource {
    /// The application's live paths
    Application,
    /// The backup tree under the backup root
    BackupLocation,
    /// The sync operation itself
    Operation,
}

/// A problem resolving or reading one configured path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathIssue {
    /// The path spec as configured, or the affected path for
    /// operation-level issues and failures inside a tree walk
    pub path_spec: String,
    /// The concrete path after token expansion, when one exists
    pub expanded_path: Option<String>,
    /// What went wrong
    pub kind: IssueKind,
    /// Which side it affects
    pub source: IssueSource,
    /// Human-readable description
    pub description: String,
}

/// How one relative key diverges between the two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferenceKind {
    /// Present in the application but not in the backup
    OnlyInApplication,
    /// Present in the backup but not in the application
    OnlyInBackup,
    /// Present on both sides with differing size or modification time
    ContentMismatch,
    /// A copy or delete for this key failed after retries
    OperationFailed,
}

/// One diverging file between application and backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDifference {
    /// The portable relative key
    pub relative_path: String,
    /// How the sides diverge
    pub kind: DifferenceKind,
    /// Metadata of the application-side file, when present
    pub app_file: Option<FileMeta>,
    /// Metadata of the backup-side file, when present
    pub backup_file: Option<FileMeta>,
    /// Human-readable description
    pub description: String,
}

/// Authoritative per-application status
///
/// These are priority outcomes, not a scale: derivation picks the first
/// matching rule from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No derivation has run; a finalized report never carries this
    Unknown,
    /// Application and backup agree
    InSync,
    /// At least one file diverges between the sides
    OutOfSync,
    /// An operation is currently running (transient, observer-only)
    Syncing,
    /// Something prevented a trustworthy result
    Failed,
    /// No divergence, but some paths could not be fully processed
    Warning,
    /// The backup root for this application does not exist yet
    NotYetBackedUp,
}

/// Report for one application produced by one engine operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// The application id
    pub app_id: String,
    /// The application's backup directory, always in directory form
    /// (trailing separator)
    pub backup_dir: String,
    /// Count of configured specs that are not blank; recorded so status
    /// derivation stays a pure function of report contents
    pub real_spec_count: usize,
    /// Path-level problems, in discovery order
    pub issues: Vec<PathIssue>,
    /// Per-file divergences, in discovery order
    pub differences: Vec<FileDifference>,
    /// The derived status
    pub status: SyncStatus,
}

impl SyncReport {
    /// Create an empty report awaiting population.
    pub fn new(
        app_id: impl Into<String>,
        backup_dir: impl Into<String>,
        real_spec_count: usize,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            backup_dir: backup_dir.into(),
            real_spec_count,
            issues: Vec::new(),
            differences: Vec::new(),
            status: SyncStatus::Unknown,
        }
    }

    /// Create a finalized Failed report from an error that escaped an
    /// application's processing.
    pub fn failure(
        app_id: impl Into<String>,
        backup_dir: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut report = Self::new(app_id, backup_dir, 0);
        report.issues.push(PathIssue {
            path_spec: report.backup_dir.clone(),
            expanded_path: None,
            kind: IssueKind::OperationFailed,
            source: IssueSource::Operation,
            description: description.into(),
        });
        report.finalize();
        report
    }

    /// Derive and store the authoritative status.
    pub fn finalize(&mut self) {
        self.status = self.derive_status();
    }

    /// Derive the status from report contents, first matching rule wins.
    ///
    /// Never returns `Unknown` or `Syncing`; those exist only as the
    /// initial and in-flight markers.
    pub fn derive_status(&self) -> SyncStatus {
        // Rule 1: anything that makes the result untrustworthy.
        if self.has_fatal_source_issue()
            || self
                .differences
                .iter()
                .any(|d| d.kind == DifferenceKind::OperationFailed)
        {
            return SyncStatus::Failed;
        }

        // Rules 2 and 3: the backup root itself is missing.
        if self.issues.iter().any(|i| self.is_backup_root_missing(i)) {
            let backup_side: Vec<&PathIssue> = self
                .issues
                .iter()
                .filter(|i| i.source == IssueSource::BackupLocation)
                .collect();
            let clean_shape = backup_side.len() == 1
                && self.is_backup_root_missing(backup_side[0])
                && self
                    .differences
                    .iter()
                    .all(|d| d.kind == DifferenceKind::OnlyInApplication)
                && self.issues.iter().all(|i| i.source != IssueSource::Operation);
            return if clean_shape {
                SyncStatus::NotYetBackedUp
            } else {
                SyncStatus::Failed
            };
        }

        // Rule 4: any remaining difference is real divergence.
        if !self.differences.is_empty() {
            return SyncStatus::OutOfSync;
        }

        // Rule 5: no divergence, but some paths were skipped or degraded.
        if !self.issues.is_empty() {
            return SyncStatus::Warning;
        }

        // Rule 6.
        SyncStatus::InSync
    }

    /// Whether the application side has a problem that blocks comparison
    /// and mutation and forces Failed: any OperationFailed issue, an
    /// app-side spec that cannot be expanded or read, or blank specs with
    /// no real spec configured at all.
    pub fn has_fatal_source_issue(&self) -> bool {
        self.issues.iter().any(|i| {
            i.kind == IssueKind::OperationFailed
                || (i.source == IssueSource::Application
                    && (matches!(i.kind, IssueKind::Unexpandable | IssueKind::Inaccessible)
                        || (i.kind == IssueKind::BlankSpec && self.real_spec_count == 0)))
        })
    }

    /// Whether `issue` is the backup-root-missing marker for this report.
    fn is_backup_root_missing(&self, issue: &PathIssue) -> bool {
        issue.kind == IssueKind::NotFound
            && issue.source == IssueSource::BackupLocation
            && issue.path_spec == self.backup_dir
    }
}
