//! Shared test utilities for the arca workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`sandbox`] — [`Sandbox`] fixture: a temp directory posing as a machine

pub mod sandbox;

pub use sandbox::{set_mtime, Sandbox};
