//! Application set configuration
//!
//! One YAML document names the backup root and the applications to
//! manage:
//!
//! ```yaml
//! backup_root: "%UserProfile%/Backups"
//! applications:
//!   - id: editor
//!     paths:
//!       - "%AppData%/Editor/settings.json"
//!       - "%Documents%/EditorProjects/"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named set of filesystem paths backed up together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Identifier; becomes the directory name under the backup root
    pub id: String,
    /// Ordered path specs; a trailing separator marks a directory tree
    #[serde(default)]
    pub paths: Vec<String>,
}

impl Application {
    /// Whether the id is usable as a single directory component.
    ///
    /// An application with an invalid id is reported as Failed; it never
    /// aborts the batch.
    pub fn has_valid_id(&self) -> bool {
        let id = self.id.trim();
        !id.is_empty()
            && id != "."
            && id != ".."
            && !id.chars().any(|c| {
                matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            })
    }
}

/// The arca configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where backups are stored; may itself use `%Token%` placeholders
    pub backup_root: String,
    /// The applications to manage
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl Config {
    /// Load a configuration document from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&text).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
