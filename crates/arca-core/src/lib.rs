//! Core orchestration layer for arca
//!
//! This crate coordinates everything between the filesystem layer and
//! the CLI, implementing:
//!
//! - **Configuration**: the application catalogue and backup root
//! - **Scanning**: path specs resolved into portable key maps
//! - **Reports**: typed issues, differences and the derived sync status
//! - **SyncEngine**: status, backup and restore over a whole catalogue
//!
//! # Architecture
//!
//! `arca-core` sits above the filesystem crate and below the CLI:
//!
//! ```text
//!      CLI
//!       |
//!   arca-core
//!       |
//!    arca-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use arca_core::{Config, NullObserver, CancelFlag, SyncEngine, SyncMode};
//! use arca_fs::SpecialFolders;
//!
//! fn example() -> arca_core::Result<()> {
//!     let config = Config::load("arca.yaml")?;
//!     let engine = SyncEngine::new(SpecialFolders::from_system(), &config.backup_root)?;
//!     let outcome = engine.backup(
//!         &config.applications,
//!         SyncMode::Copy,
//!         &NullObserver,
//!         &CancelFlag::new(),
//!     )?;
//!     for report in &outcome.reports {
//!         println!("{}: {:?}", report.app_id, report.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod report;
pub mod scan;

pub use config::{Application, Config};
pub use engine::{BatchOutcome, SyncEngine, SyncMode};
pub use error::{Error, Result};
pub use events::{CancelFlag, ChannelObserver, NullObserver, SyncEvent, SyncObserver};
pub use report::{
    DifferenceKind, FileDifference, IssueKind, IssueSource, PathIssue, SyncReport, SyncStatus,
};
pub use scan::{ScanOutcome, ScannedFile, Scanner, SpecCoverage};
