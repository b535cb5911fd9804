//! arca - Back up and restore named sets of filesystem paths

mod cli;
mod commands;
mod error;
mod signal;

use std::path::Path;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(command) => execute_command(command, &cli.config),
        None => {
            println!("{}", "arca - Back up and restore named sets of filesystem paths".green().bold());
            println!();
            println!("Run {} for available commands.", "arca --help".cyan());
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for reports and `--json`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute_command(command: Commands, config: &Path) -> Result<()> {
    match command {
        Commands::Init { force } => commands::run_init(config, force),
        Commands::List { json } => commands::run_list(config, json),
        Commands::Status { json } => commands::run_status(config, json),
        Commands::Backup { mode, json } => commands::run_backup(config, mode.into(), json),
        Commands::Restore { mode, yes, json } => {
            commands::run_restore(config, mode.into(), yes, json)
        }
        Commands::Completions { shell } => commands::run_completions(shell),
    }
}
