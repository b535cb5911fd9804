//! CLI argument parsing using clap derive

use std::path::PathBuf;

use arca_core::SyncMode;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// arca - Back up and restore named sets of filesystem paths
#[derive(Parser, Debug)]
#[command(name = "arca")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        default_value = "arca.yaml",
        env = "ARCA_CONFIG"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a starter configuration file
    ///
    /// Creates a commented configuration at the --config path (default
    /// arca.yaml) for you to edit.
    ///
    /// Examples:
    ///   arca init                    # Write arca.yaml
    ///   arca -c work.yaml init       # Write work.yaml
    ///   arca init --force            # Overwrite an existing file
    Init {
        /// Overwrite the file if it already exists
        #[arg(long)]
        force: bool,
    },

    /// List the configured applications and their path specs
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare every application against its backup
    ///
    /// Reads both sides without modifying anything and prints one status
    /// per application.
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Back up every application into the backup root
    ///
    /// Examples:
    ///   arca backup                  # Copy new and changed files
    ///   arca backup --mode sync      # Also delete backup-only leftovers
    Backup {
        /// Transfer mode
        #[arg(short, long, value_enum, default_value = "copy")]
        mode: ModeArg,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Restore every application from the backup root
    ///
    /// Sync mode mirrors the backup, deleting live files it does not
    /// cover, and asks for confirmation first.
    ///
    /// Examples:
    ///   arca restore                 # Copy backup content over live paths
    ///   arca restore --mode sync     # Mirror, with confirmation prompt
    ///   arca restore --mode sync --yes
    Restore {
        /// Transfer mode
        #[arg(short, long, value_enum, default_value = "copy")]
        mode: ModeArg,

        /// Skip the confirmation prompt before a mirroring restore
        #[arg(short, long)]
        yes: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs completion script for your shell.
    ///
    /// Examples:
    ///   arca completions bash > ~/.local/share/bash-completion/completions/arca
    ///   arca completions zsh > ~/.zfunc/_arca
    ///   arca completions fish > ~/.config/fish/completions/arca.fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Transfer mode as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Copy new and changed files, never delete anything
    Copy,
    /// Mirror the source, deleting destination-only entries
    Sync,
}

impl From<ModeArg> for SyncMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Copy => SyncMode::Copy,
            ModeArg::Sync => SyncMode::Sync,
        }
    }
}
