//! Scenario tests
//!
//! Each test walks one production shape end to end against a sandboxed
//! folder layout: the life of a freshly configured application, the
//! mirror-mode protection rules, round trips and cancellation.

use arca_core::{
    Application, CancelFlag, DifferenceKind, IssueKind, NullObserver, SyncEngine, SyncMode,
    SyncObserver, SyncReport, SyncStatus,
};
use arca_fs::{FileMeta, NormalizedPath};
use arca_test_utils::{Sandbox, set_mtime};

fn engine(sandbox: &Sandbox) -> SyncEngine {
    SyncEngine::new(sandbox.folders().clone(), &sandbox.backup_root_spec()).unwrap()
}

fn app(id: &str, paths: &[&str]) -> Application {
    Application {
        id: id.to_string(),
        paths: paths.iter().map(|p| p.to_string()).collect(),
    }
}

fn mtime_of(sandbox: &Sandbox, rel: &str) -> i64 {
    let path = NormalizedPath::new(sandbox.live_path(rel));
    FileMeta::of(&path).unwrap().modified.timestamp()
}

#[test]
fn test_new_application_is_not_yet_backed_up() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/config.json"])];

    let outcome = engine
        .update_status(&apps, &NullObserver, &CancelFlag::new())
        .unwrap();

    let report = &outcome.reports[0];
    assert_eq!(report.status, SyncStatus::NotYetBackedUp);
    assert_eq!(report.differences.len(), 1);
    assert_eq!(report.differences[0].kind, DifferenceKind::OnlyInApplication);
    assert_eq!(report.differences[0].relative_path, "%Documents%/app/config.json");
}

#[test]
fn test_fresh_backup_turns_in_sync() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/config.json"])];

    engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    let outcome = engine
        .update_status(&apps, &NullObserver, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);
    assert!(outcome.reports[0].differences.is_empty());
}

#[test]
fn test_live_edit_turns_out_of_sync() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/config.json"])];

    engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1, \"b\": 2}\n");

    let outcome = engine
        .update_status(&apps, &NullObserver, &CancelFlag::new())
        .unwrap();

    let report = &outcome.reports[0];
    assert_eq!(report.status, SyncStatus::OutOfSync);
    assert_eq!(report.differences.len(), 1);
    assert_eq!(report.differences[0].kind, DifferenceKind::ContentMismatch);
    assert_eq!(report.differences[0].relative_path, "%Documents%/app/config.json");
}

#[test]
fn test_sync_restore_recreates_a_deleted_file() {
    let sandbox = Sandbox::new();
    let live = sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    set_mtime(&live, 1_700_000_000);
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/config.json"])];

    engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    std::fs::remove_file(&live).unwrap();

    let outcome = engine
        .restore(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);
    sandbox.assert_live_exists("docs/app/config.json");
    assert_eq!(sandbox.read_live("docs/app/config.json"), "{\"a\": 1}\n");
    // The restored file carries the backup's timestamp.
    let delta = (mtime_of(&sandbox, "docs/app/config.json") - 1_700_000_000).abs();
    assert!(delta <= 2, "restored mtime drifted by {delta}s");
}

#[test]
fn test_double_copy_backup_is_idempotent() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    sandbox.write_live("docs/app/data/cache.bin", b"0123456789");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/"])];

    let first = engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    assert_eq!(first.reports[0].status, SyncStatus::InSync);

    let second = engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    assert_eq!(second.reports[0].status, SyncStatus::InSync);
    assert!(second.reports[0].differences.is_empty());
    assert!(second.reports[0].issues.is_empty());
}

#[test]
fn test_sync_round_trip_reproduces_the_live_tree() {
    let sandbox = Sandbox::new();
    let a = sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    let b = sandbox.write_live("docs/app/themes/dark.toml", b"bg = 'black'\n");
    let c = sandbox.write_live("docs/app/data/cache.bin", b"0123456789");
    set_mtime(&a, 1_700_000_000);
    set_mtime(&b, 1_700_000_100);
    set_mtime(&c, 1_700_000_200);
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/"])];

    engine
        .backup(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();
    std::fs::remove_dir_all(sandbox.live_path("docs/app")).unwrap();

    let outcome = engine
        .restore(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();
    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);

    assert_eq!(sandbox.read_live("docs/app/config.json"), "{\"a\": 1}\n");
    assert_eq!(sandbox.read_live("docs/app/themes/dark.toml"), "bg = 'black'\n");
    assert_eq!(sandbox.read_live("docs/app/data/cache.bin"), "0123456789");
    assert_eq!(mtime_of(&sandbox, "docs/app/config.json"), 1_700_000_000);
    assert_eq!(mtime_of(&sandbox, "docs/app/themes/dark.toml"), 1_700_000_100);
    assert_eq!(mtime_of(&sandbox, "docs/app/data/cache.bin"), 1_700_000_200);
}

#[test]
fn test_empty_source_sync_backup_preserves_backup() {
    let sandbox = Sandbox::new();
    let live = sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Documents%/app/"])];

    engine
        .backup(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();
    sandbox.assert_backup_exists("app", "%Documents%/app/config.json");

    // The live directory still exists but holds nothing.
    std::fs::remove_file(&live).unwrap();

    let outcome = engine
        .backup(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();

    let report = &outcome.reports[0];
    assert_eq!(report.status, SyncStatus::Warning);
    assert!(
        report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::OperationPrevented),
        "issues: {:?}",
        report.issues
    );
    sandbox.assert_backup_exists("app", "%Documents%/app/config.json");
}

#[test]
fn test_sync_backup_with_unexpandable_spec_leaves_backup_untouched() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    sandbox.write_backup("app", "%Gone%/data/save.dat", b"irreplaceable");
    sandbox.write_backup("app", "%Documents%/app/config.json", b"{}\n");
    let engine = engine(&sandbox);
    let apps = [app("app", &["%Gone%/data/", "%Documents%/app/"])];

    let outcome = engine
        .backup(&apps, SyncMode::Sync, &NullObserver, &CancelFlag::new())
        .unwrap();

    let report = &outcome.reports[0];
    assert_eq!(report.status, SyncStatus::Failed);
    assert!(
        report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::Unexpandable),
        "issues: {:?}",
        report.issues
    );
    // The backup under the dead token survives and the stale copy of
    // the healthy spec is not overwritten.
    sandbox.assert_backup_exists("app", "%Gone%/data/save.dat");
    assert_eq!(sandbox.read_backup("app", "%Documents%/app/config.json"), "{}\n");
}

/// Cancels the batch as soon as the first finalized report arrives.
struct CancelAfterFirst {
    flag: CancelFlag,
}

impl SyncObserver for CancelAfterFirst {
    fn status(&self, _app: &Application, report: &SyncReport) {
        if report.status != SyncStatus::Syncing {
            self.flag.cancel();
        }
    }
}

#[test]
fn test_cancel_stops_the_batch_between_applications() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/app/config.json", b"{\"a\": 1}\n");
    sandbox.write_live("appdata/term/profile.json", b"{}\n");
    let engine = engine(&sandbox);
    let apps = [
        app("app", &["%Documents%/app/"]),
        app("term", &["%AppData%/term/profile.json"]),
    ];

    let flag = CancelFlag::new();
    let observer = CancelAfterFirst { flag: flag.clone() };
    let outcome = engine
        .backup(&apps, SyncMode::Copy, &observer, &flag)
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);
    sandbox.assert_backup_missing("term", "%AppData%/term/profile.json");
}
