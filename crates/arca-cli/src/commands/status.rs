//! Status command implementation
//!
//! The report rendering shared by the batch commands also lives here;
//! backup and restore reuse it for their per-application output.

use std::path::Path;

use arca_core::{
    Application, CancelFlag, Config, DifferenceKind, IssueKind, NullObserver, SyncEngine,
    SyncObserver, SyncReport, SyncStatus,
};
use arca_fs::SpecialFolders;
use colored::{ColoredString, Colorize};

use crate::error::{CliError, Result};

/// Load the configuration and build an engine for this machine.
pub(crate) fn load_setup(config_path: &Path) -> Result<(Config, SyncEngine)> {
    let config = Config::load(config_path)?;
    let engine = SyncEngine::new(SpecialFolders::from_system(), &config.backup_root)?;
    tracing::debug!(
        config = %config_path.display(),
        root = %engine.backup_root(),
        "configuration loaded"
    );
    Ok((config, engine))
}

/// Color word for a derived status.
pub(crate) fn status_label(status: SyncStatus) -> ColoredString {
    match status {
        SyncStatus::InSync => "in sync".green(),
        SyncStatus::OutOfSync => "out of sync".yellow(),
        SyncStatus::NotYetBackedUp => "not yet backed up".cyan(),
        SyncStatus::Warning => "warning".yellow(),
        SyncStatus::Failed => "failed".red().bold(),
        SyncStatus::Syncing => "syncing".blue(),
        SyncStatus::Unknown => "unknown".dimmed(),
    }
}

/// Print one finalized report: the application line, then its issues and
/// differences in discovery order.
pub(crate) fn print_report(report: &SyncReport) {
    let marker = match report.status {
        SyncStatus::InSync => "+".green(),
        SyncStatus::Failed => "!".red(),
        _ => "~".yellow(),
    };
    println!(
        "  {} {} ({})",
        marker,
        report.app_id.cyan(),
        status_label(report.status)
    );

    for issue in &report.issues {
        let tag = match issue.kind {
            IssueKind::OperationFailed => "!".red(),
            _ => "!".yellow(),
        };
        println!(
            "      {} {}: {}",
            tag,
            issue.path_spec.cyan(),
            issue.description
        );
    }
    for diff in &report.differences {
        let tag = match diff.kind {
            DifferenceKind::OperationFailed => "!".red(),
            _ => "~".yellow(),
        };
        println!(
            "      {} {}: {}",
            tag,
            diff.relative_path.cyan(),
            diff.description
        );
    }
}

/// Count of Failed reports in a batch.
pub(crate) fn failed_count(reports: &[SyncReport]) -> usize {
    reports
        .iter()
        .filter(|r| r.status == SyncStatus::Failed)
        .count()
}

/// Renders engine callbacks inline as a mutating batch runs.
pub(crate) struct ConsoleObserver;

impl SyncObserver for ConsoleObserver {
    fn progress(&self, percent: u8) {
        println!("      {}", format!("{percent}% complete").dimmed());
    }

    fn status(&self, _app: &Application, report: &SyncReport) {
        if report.status == SyncStatus::Syncing {
            println!("  {} {}", "syncing".blue(), report.app_id.cyan());
        } else {
            print_report(report);
        }
    }
}

/// Run the status command
pub fn run_status(config_path: &Path, json: bool) -> Result<()> {
    let (config, engine) = load_setup(config_path)?;

    let outcome = engine.update_status(&config.applications, &NullObserver, &CancelFlag::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.reports)?);
    } else {
        println!(
            "{} Checking {} application(s) against {}",
            "=>".blue().bold(),
            config.applications.len(),
            engine.backup_root().as_str().cyan()
        );
        println!();
        for report in &outcome.reports {
            print_report(report);
        }
        println!();
    }

    let failed = failed_count(&outcome.reports);
    if failed > 0 {
        if !json {
            println!(
                "{} {} of {} application(s) failed.",
                "ERROR".red().bold(),
                failed,
                outcome.reports.len()
            );
        }
        return Err(CliError::user(format!("{failed} application(s) failed")));
    }
    if !json {
        println!(
            "{} {} application(s) checked.",
            "OK".green().bold(),
            outcome.reports.len()
        );
    }
    Ok(())
}
