//! Command implementations for arca-cli

pub mod backup;
pub mod completions;
pub mod init;
pub mod list;
pub mod restore;
pub mod status;

pub use backup::run_backup;
pub use completions::run_completions;
pub use init::run_init;
pub use list::run_list;
pub use restore::run_restore;
pub use status::run_status;
