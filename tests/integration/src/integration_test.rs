//! End-to-end integration test for the vertical slice
//!
//! These tests exercise the complete flow the CLI drives: config loading
//! -> engine construction -> backup -> status -> restore, with reports
//! flowing out through the observer seam.

use std::fs;
use std::sync::mpsc;

use arca_core::{
    Application, CancelFlag, ChannelObserver, Config, NullObserver, SyncEngine, SyncEvent,
    SyncMode, SyncStatus,
};
use arca_fs::{NormalizedPath, RootLock};
use arca_test_utils::Sandbox;

/// Write a two-application config into the sandbox and load it back.
fn setup_config(sandbox: &Sandbox) -> Config {
    let path = sandbox.root().join("arca.yaml");
    fs::write(
        &path,
        format!(
            "backup_root: '{}'\n\
             applications:\n\
             \x20 - id: editor\n\
             \x20   paths:\n\
             \x20     - '%Documents%/editor/'\n\
             \x20 - id: terminal\n\
             \x20   paths:\n\
             \x20     - '%AppData%/terminal/profile.json'\n",
            sandbox.backup_root_spec()
        ),
    )
    .unwrap();
    Config::load(&path).unwrap()
}

fn engine_for(sandbox: &Sandbox, config: &Config) -> SyncEngine {
    SyncEngine::new(sandbox.folders().clone(), &config.backup_root).unwrap()
}

fn seed_live_content(sandbox: &Sandbox) {
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\n");
    sandbox.write_live("docs/editor/themes/dark.toml", b"background = 'black'\n");
    sandbox.write_live("appdata/terminal/profile.json", b"{\"shell\": \"fish\"}\n");
}

#[test]
fn test_load_config_and_build_engine() {
    let sandbox = Sandbox::new();
    let config = setup_config(&sandbox);

    assert_eq!(config.applications.len(), 2);
    assert_eq!(config.applications[0].id, "editor");
    assert_eq!(config.applications[1].id, "terminal");
    assert_eq!(
        config.applications[1].paths,
        vec!["%AppData%/terminal/profile.json"]
    );

    let engine = engine_for(&sandbox, &config);
    assert_eq!(engine.backup_root().as_str(), sandbox.backup_root_spec());
}

#[test]
fn test_full_vertical_slice() {
    let sandbox = Sandbox::new();
    seed_live_content(&sandbox);
    let config = setup_config(&sandbox);
    let engine = engine_for(&sandbox, &config);
    let cancel = CancelFlag::new();

    // 1. Nothing has been backed up yet
    let outcome = engine
        .update_status(&config.applications, &NullObserver, &cancel)
        .unwrap();
    assert_eq!(outcome.reports.len(), 2);
    assert!(!outcome.cancelled);
    for report in &outcome.reports {
        assert_eq!(report.status, SyncStatus::NotYetBackedUp);
    }

    // 2. First backup copies everything
    let outcome = engine
        .backup(&config.applications, SyncMode::Copy, &NullObserver, &cancel)
        .unwrap();
    for report in &outcome.reports {
        assert_eq!(report.status, SyncStatus::InSync, "{}", report.app_id);
    }
    sandbox.assert_backup_exists("editor", "%Documents%/editor/main.cfg");
    sandbox.assert_backup_exists("editor", "%Documents%/editor/themes/dark.toml");
    sandbox.assert_backup_exists("terminal", "%AppData%/terminal/profile.json");

    // 3. Status agrees with the fresh backup
    let outcome = engine
        .update_status(&config.applications, &NullObserver, &cancel)
        .unwrap();
    for report in &outcome.reports {
        assert_eq!(report.status, SyncStatus::InSync);
    }

    // 4. A live edit shows up as out of sync for that application only
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\nwrap = true\n");
    let outcome = engine
        .update_status(&config.applications, &NullObserver, &cancel)
        .unwrap();
    assert_eq!(outcome.reports[0].status, SyncStatus::OutOfSync);
    assert_eq!(outcome.reports[1].status, SyncStatus::InSync);

    // 5. Backing up again reconverges
    let outcome = engine
        .backup(&config.applications, SyncMode::Copy, &NullObserver, &cancel)
        .unwrap();
    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);
    assert_eq!(
        sandbox.read_backup("editor", "%Documents%/editor/main.cfg"),
        "columns = 120\nwrap = true\n"
    );
}

#[test]
fn test_channel_observer_sees_syncing_then_final() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\n");
    let config = setup_config(&sandbox);
    let engine = engine_for(&sandbox, &config);

    let apps = vec![config.applications[0].clone()];
    let (tx, rx) = mpsc::channel();
    let observer = ChannelObserver::new(tx);
    engine
        .backup(&apps, SyncMode::Copy, &observer, &CancelFlag::new())
        .unwrap();
    drop(observer);

    let events: Vec<SyncEvent> = rx.iter().collect();
    assert_eq!(events.len(), 3, "events: {events:?}");
    match &events[0] {
        SyncEvent::Status { app_id, report } => {
            assert_eq!(app_id, "editor");
            assert_eq!(report.status, SyncStatus::Syncing);
        }
        other => panic!("expected a Syncing status first, got {other:?}"),
    }
    match &events[1] {
        SyncEvent::Status { report, .. } => assert_eq!(report.status, SyncStatus::InSync),
        other => panic!("expected the final status second, got {other:?}"),
    }
    match &events[2] {
        SyncEvent::Progress(percent) => assert_eq!(*percent, 100),
        other => panic!("expected progress last, got {other:?}"),
    }
}

#[test]
fn test_batch_isolates_a_bad_application() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\n");
    let config = setup_config(&sandbox);
    let engine = engine_for(&sandbox, &config);

    let apps = vec![
        Application {
            id: "bad/slash".to_string(),
            paths: vec!["%Documents%/editor/".to_string()],
        },
        config.applications[0].clone(),
    ];

    let outcome = engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    assert_eq!(outcome.reports[0].status, SyncStatus::Failed);
    assert_eq!(outcome.reports[1].status, SyncStatus::InSync);
    sandbox.assert_backup_exists("editor", "%Documents%/editor/main.cfg");
}

#[test]
fn test_backup_root_with_token_expands() {
    let sandbox = Sandbox::new();
    sandbox.write_live("appdata/terminal/profile.json", b"{}\n");

    let engine =
        SyncEngine::new(sandbox.folders().clone(), "%Documents%/backups").unwrap();
    assert!(engine.backup_root().as_str().ends_with("live/docs/backups"));

    let apps = vec![Application {
        id: "terminal".to_string(),
        paths: vec!["%AppData%/terminal/profile.json".to_string()],
    }];
    let outcome = engine
        .backup(&apps, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
    assert_eq!(outcome.reports[0].status, SyncStatus::InSync);
    sandbox.assert_live_exists("docs/backups/terminal/%AppData%/terminal/profile.json");
}

#[test]
fn test_lock_contention_fails_the_whole_batch() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\n");
    let config = setup_config(&sandbox);
    let engine = engine_for(&sandbox, &config);

    let root = NormalizedPath::new(sandbox.backup_root());
    let held = RootLock::acquire(&root).unwrap();

    let err = engine
        .backup(&config.applications, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, arca_core::Error::Fs(_)), "got {err:?}");

    drop(held);
    engine
        .backup(&config.applications, SyncMode::Copy, &NullObserver, &CancelFlag::new())
        .unwrap();
}

#[test]
fn test_reports_serialize_for_machine_output() {
    let sandbox = Sandbox::new();
    sandbox.write_live("docs/editor/main.cfg", b"columns = 120\n");
    let config = setup_config(&sandbox);
    let engine = engine_for(&sandbox, &config);

    let outcome = engine
        .update_status(&config.applications, &NullObserver, &CancelFlag::new())
        .unwrap();
    let value = serde_json::to_value(&outcome.reports).unwrap();

    let reports = value.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["app_id"], "editor");
    assert_eq!(reports[0]["status"], "NotYetBackedUp");
    assert!(reports[0]["differences"].is_array());
    assert!(reports[0]["issues"].is_array());
}
