//! Sync timing configuration.

use std::time::Duration;

/// Default debounce window before a sync becomes eligible.
const DEFAULT_WINDOW_SECS: u64 = 10;

/// Default cadence of the auto-sync loop.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Timing configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Debounce window after which a sync becomes eligible
    pub window: Duration,
    /// Cadence at which the auto-sync loop checks eligibility
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl SyncConfig {
    /// Set the debounce window.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the loop cadence.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
