//! Per-session sync state

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SyncConfig;

use super::clock::SyncClock;

/// Eligibility flags gating the auto-sync loop.
///
/// `pending_sync_needed` is set by the clock when the debounce window
/// elapses; `modified_since_last_sync` by the controller on every tracked
/// mutation. A sync runs only on their conjunction.
#[derive(Debug, Default)]
pub struct SyncFlags {
    pending_sync_needed: AtomicBool,
    modified_since_last_sync: AtomicBool,
}

impl SyncFlags {
    pub(crate) fn mark_sync_due(&self) {
        self.pending_sync_needed.store(true, Ordering::SeqCst);
    }

    /// Record that a local mutation happened since the last sync attempt.
    pub fn mark_modified(&self) {
        self.modified_since_last_sync.store(true, Ordering::SeqCst);
    }

    /// Has the debounce window elapsed?
    pub fn sync_pending(&self) -> bool {
        self.pending_sync_needed.load(Ordering::SeqCst)
    }

    /// Has anything changed locally since the last sync attempt?
    pub fn modified(&self) -> bool {
        self.modified_since_last_sync.load(Ordering::SeqCst)
    }

    /// True once the window elapsed AND a local mutation occurred.
    pub fn sync_due(&self) -> bool {
        self.sync_pending() && self.modified()
    }

    /// Reset both flags, consuming the current eligibility.
    pub fn clear(&self) {
        self.pending_sync_needed.store(false, Ordering::SeqCst);
        self.modified_since_last_sync.store(false, Ordering::SeqCst);
    }
}

/// Ephemeral sync state for one editor session.
///
/// Owns the eligibility flags and the single active clock; shared by
/// reference between the controller, the clock task, and the loop task.
/// One instance per editor session, dropped when the session ends.
pub struct SyncSession {
    flags: Arc<SyncFlags>,
    clock: SyncClock,
}

impl SyncSession {
    pub fn new(config: &SyncConfig) -> Self {
        let flags = Arc::new(SyncFlags::default());
        let clock = SyncClock::new(config.window, Arc::clone(&flags));
        Self { flags, clock }
    }

    pub fn flags(&self) -> &Arc<SyncFlags> {
        &self.flags
    }

    /// Restart the debounce clock; any previous countdown is cancelled.
    pub fn restart_clock(&self) {
        self.clock.start();
    }
}
