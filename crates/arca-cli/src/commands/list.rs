//! List command implementation

use std::path::Path;

use colored::Colorize;

use arca_core::Config;

use crate::error::Result;

/// Run the list command
pub fn run_list(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Backup root: {}", config.backup_root.cyan());
    println!();

    if config.applications.is_empty() {
        println!("{}", "No applications configured.".dimmed());
        return Ok(());
    }

    for app in &config.applications {
        println!(
            "  {} {} ({} spec(s))",
            "+".green(),
            app.id.cyan(),
            app.paths.len()
        );
        for spec in &app.paths {
            println!("      {}", spec.dimmed());
        }
    }
    Ok(())
}
