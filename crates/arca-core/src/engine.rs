//! Synchronization engine
//!
//! Drives status checks, backups and restores for a set of applications
//! against one backup root. Applications are processed sequentially in
//! input order; anything that goes wrong with one application is folded
//! into its report and the batch moves on. Only argument-phase problems,
//! such as an unusable backup root or a held lock, abort a call.

use std::collections::BTreeMap;
use std::fs;

use arca_fs::{retry, FileMeta, NormalizedPath, RootLock, SpecialFolders};
use walkdir::WalkDir;

use crate::config::Application;
use crate::error::{Error, Result};
use crate::events::{CancelFlag, SyncObserver};
use crate::report::{
    DifferenceKind, FileDifference, IssueKind, IssueSource, PathIssue, SyncReport, SyncStatus,
};
use crate::scan::{ScanOutcome, ScannedFile, Scanner};

/// Transfer mode for backup and restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Copy new and changed files, never delete anything.
    Copy,
    /// Copy and additionally delete destination entries whose source is
    /// gone, subject to the preservation rules.
    Sync,
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// One report per requested application, in input order. Shorter than
    /// the input when a cancel request stopped the batch early.
    pub reports: Vec<SyncReport>,
    /// True when a cancel request was observed.
    pub cancelled: bool,
}

/// The engine owning a resolved token table and a validated backup root.
#[derive(Debug)]
pub struct SyncEngine {
    folders: SpecialFolders,
    backup_root: NormalizedPath,
}

impl SyncEngine {
    /// Create an engine rooted at `backup_root`, which may contain
    /// tokens. The root is validated here but not created; mutating
    /// operations create it on first use.
    pub fn new(folders: SpecialFolders, backup_root: &str) -> Result<Self> {
        let trimmed = backup_root.trim();
        if trimmed.is_empty() {
            return Err(Error::BackupRoot {
                root: backup_root.to_string(),
                reason: "backup root is blank".to_string(),
            });
        }
        let expanded = folders.expand(trimmed);
        if folders.has_token(&expanded) {
            return Err(Error::BackupRoot {
                root: backup_root.to_string(),
                reason: format!("unresolved placeholder in '{expanded}'"),
            });
        }
        Ok(Self {
            folders,
            backup_root: NormalizedPath::new(&expanded),
        })
    }

    pub fn folders(&self) -> &SpecialFolders {
        &self.folders
    }

    pub fn backup_root(&self) -> &NormalizedPath {
        &self.backup_root
    }

    /// Compare every application against its backup without touching
    /// either side. Does not take the root lock and emits no progress.
    pub fn update_status(
        &self,
        apps: &[Application],
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
    ) -> Result<BatchOutcome> {
        self.run_batch(apps, observer, cancel, false, |app| self.check_one(app))
    }

    /// Back up every application into the backup root.
    pub fn backup(
        &self,
        apps: &[Application],
        mode: SyncMode,
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
    ) -> Result<BatchOutcome> {
        let lock = RootLock::acquire(&self.backup_root)?;
        tracing::debug!("backup of {} application(s), lock at {}", apps.len(), lock.path().display());
        self.run_batch(apps, observer, cancel, true, |app| {
            self.backup_one(app, mode, observer, cancel)
        })
    }

    /// Restore every application from the backup root onto the live
    /// system.
    pub fn restore(
        &self,
        apps: &[Application],
        mode: SyncMode,
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
    ) -> Result<BatchOutcome> {
        let lock = RootLock::acquire(&self.backup_root)?;
        tracing::debug!("restore of {} application(s), lock at {}", apps.len(), lock.path().display());
        self.run_batch(apps, observer, cancel, true, |app| {
            self.restore_one(app, mode, observer, cancel)
        })
    }

    fn run_batch<F>(
        &self,
        apps: &[Application],
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
        report_progress: bool,
        mut process: F,
    ) -> Result<BatchOutcome>
    where
        F: FnMut(&Application) -> SyncReport,
    {
        let total = apps.len();
        let mut reports = Vec::with_capacity(total);
        let mut cancelled = false;

        for (done, app) in apps.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let report = if app.has_valid_id() {
                process(app)
            } else {
                SyncReport::failure(
                    app.id.clone(),
                    self.backup_root.dir_form(),
                    format!("invalid application id '{}'", app.id),
                )
            };
            tracing::debug!(app = %report.app_id, status = ?report.status, "application processed");
            observer.status(app, &report);
            reports.push(report);

            if report_progress {
                observer.progress(((done + 1) * 100 / total) as u8);
            }
        }

        if cancel.is_cancelled() {
            cancelled = true;
        }
        Ok(BatchOutcome { reports, cancelled })
    }

    /// Directory-form backup location for one application.
    fn app_backup_dir(&self, app: &Application) -> NormalizedPath {
        self.backup_root.join(app.id.trim())
    }

    fn check_one(&self, app: &Application) -> SyncReport {
        let backup_dir = self.app_backup_dir(app);
        let mut report = SyncReport::new(
            app.id.trim(),
            backup_dir.dir_form(),
            real_spec_count(&app.paths),
        );

        let scanner = Scanner::new(&self.folders);
        let app_side = scanner.scan_specs(&app.paths, IssueSource::Application);
        let backup_side = scanner.scan_tree(&backup_dir, IssueSource::BackupLocation);

        report.issues.extend(app_side.issues.iter().cloned());
        report.issues.extend(backup_side.issues.iter().cloned());

        // Differences against an unreliable side would be noise: skip
        // them when the application side is fatally broken or the backup
        // side could not be read. A merely missing backup root still
        // diffs against the empty map, so the not-yet-backed-up shape
        // keeps its OnlyInApplication entries.
        let backup_unreadable = backup_side
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::Inaccessible);
        if !report.has_fatal_source_issue() && !backup_unreadable {
            report.differences = diff_maps(&app_side.files, &backup_side.files);
        }

        report.finalize();
        report
    }

    fn backup_one(
        &self,
        app: &Application,
        mode: SyncMode,
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
    ) -> SyncReport {
        let backup_dir = self.app_backup_dir(app);
        let mut report = SyncReport::new(
            app.id.trim(),
            backup_dir.dir_form(),
            real_spec_count(&app.paths),
        );
        report.status = SyncStatus::Syncing;
        observer.status(app, &report);

        let scanner = Scanner::new(&self.folders);
        let source = scanner.scan_specs(&app.paths, IssueSource::Application);
        report.issues.extend(source.issues.iter().cloned());

        if report.has_fatal_source_issue() {
            // An unexpandable or unreadable spec leaves the source
            // listing incomplete. Stopping before any write keeps Sync
            // cleanup from deleting entries the scan never saw.
            report.finalize();
            return report;
        }

        if source.files.is_empty() {
            // Nothing to copy. In Sync mode refusing to go further is
            // what keeps an existing backup from being deleted wholesale.
            if mode == SyncMode::Sync {
                report.issues.push(PathIssue {
                    path_spec: backup_dir.dir_form(),
                    expanded_path: Some(backup_dir.as_str().to_string()),
                    kind: IssueKind::OperationPrevented,
                    source: IssueSource::Operation,
                    description: "no source content; existing backup left untouched".to_string(),
                });
            }
            report.finalize();
            return report;
        }

        if let Err(e) = retry::create_dir_all(&backup_dir) {
            report.issues.push(PathIssue {
                path_spec: backup_dir.dir_form(),
                expanded_path: Some(backup_dir.as_str().to_string()),
                kind: IssueKind::OperationFailed,
                source: IssueSource::Operation,
                description: format!("cannot create backup directory: {e}"),
            });
            report.finalize();
            return report;
        }

        let backup_side = scanner.scan_tree(&backup_dir, IssueSource::BackupLocation);
        report.issues.extend(backup_side.issues.iter().cloned());

        let mut interrupted = false;
        for (key, file) in &source.files {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }
            if let Some(existing) = backup_side.files.get(key) {
                if existing.meta.matches(&file.meta) {
                    continue;
                }
            }
            let dst = backup_dir.join(key);
            if let Err(e) = retry::copy_file(&file.path, &dst) {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OperationFailed,
                    app_file: Some(file.meta),
                    backup_file: backup_side.files.get(key).map(|f| f.meta),
                    description: format!("copy failed: {e}"),
                });
            }
        }

        if mode == SyncMode::Sync && !interrupted {
            self.delete_backup_extras(&source, &backup_side, &mut report, cancel, &mut interrupted);
            prune_empty_dirs(&backup_dir);
        }

        if interrupted {
            report.issues.push(cancelled_issue(&backup_dir));
        }
        report.finalize();
        report
    }

    /// Delete backed-up entries whose key is absent from the source map,
    /// keeping everything covered by a spec that resolved to nothing.
    fn delete_backup_extras(
        &self,
        source: &ScanOutcome,
        backup_side: &ScanOutcome,
        report: &mut SyncReport,
        cancel: &CancelFlag,
        interrupted: &mut bool,
    ) {
        for (key, file) in &backup_side.files {
            if cancel.is_cancelled() {
                *interrupted = true;
                return;
            }
            if source.files.contains_key(key) {
                continue;
            }
            let protected = source
                .coverage
                .iter()
                .any(|row| row.missing_or_empty && row.covers(key, &self.folders));
            if protected {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OnlyInBackup,
                    app_file: None,
                    backup_file: Some(file.meta),
                    description: "preserved: source path is missing or empty".to_string(),
                });
                continue;
            }
            if let Err(e) = retry::remove_file(&file.path) {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OperationFailed,
                    app_file: None,
                    backup_file: Some(file.meta),
                    description: format!("delete failed: {e}"),
                });
            }
        }
    }

    fn restore_one(
        &self,
        app: &Application,
        mode: SyncMode,
        observer: &dyn SyncObserver,
        cancel: &CancelFlag,
    ) -> SyncReport {
        let backup_dir = self.app_backup_dir(app);
        let mut report = SyncReport::new(
            app.id.trim(),
            backup_dir.dir_form(),
            real_spec_count(&app.paths),
        );
        report.status = SyncStatus::Syncing;
        observer.status(app, &report);

        let scanner = Scanner::new(&self.folders);
        let backup_side = scanner.scan_tree(&backup_dir, IssueSource::BackupLocation);
        let root_missing = backup_side
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::NotFound && i.path_spec == report.backup_dir);
        report.issues.extend(backup_side.issues.iter().cloned());
        if root_missing {
            report.finalize();
            return report;
        }

        let backup_unreadable = backup_side
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::Inaccessible);
        if backup_unreadable {
            // An unreadable portion of the backup hides keys whose live
            // counterparts would then look like extras to Sync cleanup.
            report.issues.push(PathIssue {
                path_spec: backup_dir.dir_form(),
                expanded_path: Some(backup_dir.as_str().to_string()),
                kind: IssueKind::OperationPrevented,
                source: IssueSource::Operation,
                description: "backup not fully readable; restore skipped".to_string(),
            });
            report.finalize();
            return report;
        }

        let mut interrupted = false;
        for (key, file) in &backup_side.files {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }
            let Some(target) = self.folders.expand_key(key) else {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OperationFailed,
                    app_file: None,
                    backup_file: Some(file.meta),
                    description: "cannot map backup entry to a live path".to_string(),
                });
                continue;
            };
            let target = NormalizedPath::new(&target);
            if FileMeta::of(&target).is_ok_and(|meta| meta.matches(&file.meta)) {
                continue;
            }
            if let Err(e) = retry::copy_file(&file.path, &target) {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OperationFailed,
                    app_file: None,
                    backup_file: Some(file.meta),
                    description: format!("restore failed: {e}"),
                });
            }
        }

        if mode == SyncMode::Sync && !interrupted {
            self.delete_live_extras(app, &backup_side, &scanner, &mut report, cancel, &mut interrupted);
        }

        if interrupted {
            report.issues.push(cancelled_issue(&backup_dir));
        }
        report.finalize();
        report
    }

    /// Delete live files whose key is absent from the backup map, keeping
    /// everything in a zone the backup holds no content for. A spec that
    /// was never backed up must not have its live content removed.
    /// Directories the deletions empty out are pruned afterwards.
    fn delete_live_extras(
        &self,
        app: &Application,
        backup_side: &ScanOutcome,
        scanner: &Scanner<'_>,
        report: &mut SyncReport,
        cancel: &CancelFlag,
        interrupted: &mut bool,
    ) {
        let live = scanner.scan_specs(&app.paths, IssueSource::Application);
        report.issues.extend(live.issues.iter().cloned());

        for (key, file) in &live.files {
            if cancel.is_cancelled() {
                *interrupted = true;
                return;
            }
            if backup_side.files.contains_key(key) {
                continue;
            }
            let deletable = live.coverage.iter().any(|row| {
                row.covers(key, &self.folders)
                    && backup_side.files.keys().any(|k| row.covers(k, &self.folders))
            });
            if !deletable {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OnlyInApplication,
                    app_file: Some(file.meta),
                    backup_file: None,
                    description: "preserved: no backup content covers this path".to_string(),
                });
                continue;
            }
            if let Err(e) = retry::remove_file(&file.path) {
                report.differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::OperationFailed,
                    app_file: Some(file.meta),
                    backup_file: None,
                    description: format!("delete failed: {e}"),
                });
            }
        }

        // Deletions can leave empty directories behind; sweep them out
        // beneath each tree spec's root.
        for root in live
            .coverage
            .iter()
            .filter(|row| row.dir_form)
            .filter_map(|row| row.expanded.as_ref())
        {
            prune_empty_dirs(root);
        }
    }
}

fn real_spec_count(paths: &[String]) -> usize {
    paths.iter().filter(|s| !s.trim().is_empty()).count()
}

fn cancelled_issue(backup_dir: &NormalizedPath) -> PathIssue {
    PathIssue {
        path_spec: backup_dir.dir_form(),
        expanded_path: Some(backup_dir.as_str().to_string()),
        kind: IssueKind::OperationPrevented,
        source: IssueSource::Operation,
        description: "cancelled before completion".to_string(),
    }
}

/// Compare two key spaces. Keys present on both sides with matching
/// metadata produce nothing.
fn diff_maps(
    app: &BTreeMap<String, ScannedFile>,
    backup: &BTreeMap<String, ScannedFile>,
) -> Vec<FileDifference> {
    let mut differences = Vec::new();

    for (key, file) in app {
        match backup.get(key) {
            None => differences.push(FileDifference {
                relative_path: key.clone(),
                kind: DifferenceKind::OnlyInApplication,
                app_file: Some(file.meta),
                backup_file: None,
                description: "not present in the backup".to_string(),
            }),
            Some(other) if !file.meta.matches(&other.meta) => {
                differences.push(FileDifference {
                    relative_path: key.clone(),
                    kind: DifferenceKind::ContentMismatch,
                    app_file: Some(file.meta),
                    backup_file: Some(other.meta),
                    description: describe_mismatch(&file.meta, &other.meta),
                });
            }
            Some(_) => {}
        }
    }

    for (key, file) in backup {
        if !app.contains_key(key) {
            differences.push(FileDifference {
                relative_path: key.clone(),
                kind: DifferenceKind::OnlyInBackup,
                app_file: None,
                backup_file: Some(file.meta),
                description: "not present in the application".to_string(),
            });
        }
    }

    differences
}

fn describe_mismatch(app: &FileMeta, backup: &FileMeta) -> String {
    if app.len != backup.len {
        format!("size differs: {} vs {} bytes", app.len, backup.len)
    } else {
        format!(
            "modified time differs: {} vs {}",
            app.modified, backup.modified
        )
    }
}

/// Remove directories left empty under `base`, deepest first. The base
/// itself is kept.
fn prune_empty_dirs(base: &NormalizedPath) {
    let walker = WalkDir::new(base.to_native())
        .min_depth(1)
        .contents_first(true)
        .follow_links(false);
    for entry in walker.into_iter().flatten() {
        if entry.file_type().is_dir() {
            // Fails on non-empty directories, which is exactly the filter.
            let _ = fs::remove_dir(entry.path());
        }
    }
}
