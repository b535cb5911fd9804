//! Restore command implementation

use std::path::Path;

use arca_core::{NullObserver, SyncMode};
use colored::Colorize;
use dialoguer::Confirm;

use crate::error::{CliError, Result};
use crate::signal;

use super::status::{ConsoleObserver, failed_count, load_setup};

/// Run the restore command
pub fn run_restore(config_path: &Path, mode: SyncMode, yes: bool, json: bool) -> Result<()> {
    let (config, engine) = load_setup(config_path)?;

    if mode == SyncMode::Sync && !yes {
        let proceed = Confirm::new()
            .with_prompt(
                "A mirroring restore deletes live files the backup does not cover. Continue?",
            )
            .default(false)
            .interact()?;
        if !proceed {
            return Err(CliError::user("Restore cancelled by user."));
        }
    }

    let cancel = signal::install_signal_handlers();

    if !json {
        println!(
            "{} Restoring {} application(s) from {}",
            "=>".blue().bold(),
            config.applications.len(),
            engine.backup_root().as_str().cyan()
        );
        println!();
    }

    let outcome = if json {
        engine.restore(&config.applications, mode, &NullObserver, &cancel)?
    } else {
        engine.restore(&config.applications, mode, &ConsoleObserver, &cancel)?
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "cancelled": outcome.cancelled,
                "reports": outcome.reports,
            }))?
        );
    }

    let failed = failed_count(&outcome.reports);
    if outcome.cancelled {
        if !json {
            println!();
            println!(
                "{} Restore cancelled before completion.",
                "INTERRUPTED".yellow().bold()
            );
        }
        return Err(CliError::user("restore cancelled"));
    }
    if failed > 0 {
        if !json {
            println!();
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
        println!();
        println!("{} Restore complete.", "OK".green().bold());
    }
    Ok(())
}
