//! Observer and cancellation seams for engine operations
//!
//! The engine hands progress and per-application reports to a
//! [`SyncObserver`]. Implementations own their delivery context: render
//! inline, forward over a channel to another thread, or discard.
//! Callbacks are fire-and-forget; the engine never blocks on an observer
//! and never reads anything back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use crate::config::Application;
use crate::report::SyncReport;

/// Receives progress and per-application results during a batch.
pub trait SyncObserver {
    /// Overall batch progress, 0 to 100, emitted after each application
    /// in a mutating batch.
    fn progress(&self, _percent: u8) {}

    /// A report for one application: a transient Syncing marker when a
    /// mutating operation starts, then exactly one finalized report.
    fn status(&self, _app: &Application, _report: &SyncReport) {}
}

/// Observer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SyncObserver for NullObserver {}

/// Events forwarded by [`ChannelObserver`].
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Batch progress, 0 to 100
    Progress(u8),
    /// A report for one application
    Status {
        app_id: String,
        report: SyncReport,
    },
}

/// Forwards engine events over an mpsc channel.
///
/// This is the "deliver somewhere else" implementation: the receiving
/// end lives on whatever thread wants the events. A hung-up receiver is
/// ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<SyncEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<SyncEvent>) -> Self {
        Self { tx }
    }
}

impl SyncObserver for ChannelObserver {
    fn progress(&self, percent: u8) {
        let _ = self.tx.send(SyncEvent::Progress(percent));
    }

    fn status(&self, app: &Application, report: &SyncReport) {
        let _ = self.tx.send(SyncEvent::Status {
            app_id: app.id.clone(),
            report: report.clone(),
        });
    }
}

/// Cooperative cancellation flag.
///
/// The engine checks it between applications and between files; setting
/// it never interrupts an individual file operation in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the batch in flight.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
