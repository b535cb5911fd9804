//! Init command implementation
//!
//! Writes a commented starter configuration for the user to edit.

use std::path::Path;

use colored::Colorize;

use crate::error::{CliError, Result};

/// What `arca init` writes when the target file does not exist.
const STARTER_CONFIG: &str = r#"# arca configuration
#
# backup_root is where backups land, one directory per application id.
# %Token% placeholders are resolved against this machine's special
# folders (%UserProfile%, %Documents%, %AppData%, ...).
backup_root: "%UserProfile%/Backups"

# Each application is a named set of path specs. A trailing slash marks
# a directory tree; without one the spec names a single file.
applications:
  - id: editor
    paths:
      - "%AppData%/Editor/settings.json"
      - "%Documents%/EditorProjects/"
"#;

/// Run the init command
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(CliError::user(format!(
            "'{}' already exists. Pass --force to overwrite it.",
            config_path.display()
        )));
    }

    std::fs::write(config_path, STARTER_CONFIG)?;

    println!(
        "{} Wrote starter configuration to {}",
        "OK".green().bold(),
        config_path.display().to_string().cyan()
    );
    println!();
    println!("Edit it, then run {} to see where you stand.", "arca status".cyan());
    Ok(())
}
