//! Debounce clock gating remote sync

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::session::SyncFlags;

/// Single-shot, restartable countdown.
///
/// On expiry it licenses the auto-sync loop by flagging the session as
/// sync-pending; it never triggers a sync itself. Superseding via
/// [`SyncClock::start`] is the only cancellation primitive; there is no
/// separate stop.
pub struct SyncClock {
    window: Duration,
    flags: Arc<SyncFlags>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClock {
    pub fn new(window: Duration, flags: Arc<SyncFlags>) -> Self {
        Self {
            window,
            flags,
            handle: Mutex::new(None),
        }
    }

    /// Begin a fresh countdown, cancelling any countdown already running.
    ///
    /// The previous timer task is aborted before the replacement is
    /// spawned, so at most one live timer exists at any point; a callback
    /// already past its sleep still only sets a flag, which the restart
    /// immediately supersedes anyway.
    pub fn start(&self) {
        let flags = Arc::clone(&self.flags);
        let window = self.window;

        let mut slot = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            flags.mark_sync_due();
            tracing::debug!("Sync window elapsed");
        }));
    }
}

impl Drop for SyncClock {
    fn drop(&mut self) {
        let slot = self.handle.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}
