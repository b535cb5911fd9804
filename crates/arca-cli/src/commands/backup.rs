//! Backup command implementation

use std::path::Path;

use arca_core::{NullObserver, SyncMode};
use colored::Colorize;

use crate::error::{CliError, Result};
use crate::signal;

use super::status::{ConsoleObserver, failed_count, load_setup};

/// Run the backup command
pub fn run_backup(config_path: &Path, mode: SyncMode, json: bool) -> Result<()> {
    let (config, engine) = load_setup(config_path)?;
    let cancel = signal::install_signal_handlers();

    if !json {
        println!(
            "{} Backing up {} application(s) to {}",
            "=>".blue().bold(),
            config.applications.len(),
            engine.backup_root().as_str().cyan()
        );
        println!();
    }

    let outcome = if json {
        engine.backup(&config.applications, mode, &NullObserver, &cancel)?
    } else {
        engine.backup(&config.applications, mode, &ConsoleObserver, &cancel)?
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
                "{} Backup cancelled before completion.",
                "INTERRUPTED".yellow().bold()
            );
        }
        return Err(CliError::user("backup cancelled"));
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
        println!("{} Backup complete.", "OK".green().bold());
    }
    Ok(())
}
