//! Edit session controller
//!
//! Wires mutation events from the editing surface to the draft store and
//! the sync pipeline. Opening a session populates the in-memory draft
//! from storage without writing back or flagging a modification; every
//! later mutation persists synchronously before the call returns, so a
//! crash right after an edit never loses it.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::config::SyncConfig;
use crate::db::DraftStore;
use crate::error::Result;
use crate::models::{Draft, SiteId};
use crate::sync::{AutoSync, ResolvedFrom, SyncOutcome, SyncService, SyncSession};

/// Controller for one site's editing session.
pub struct EditSession {
    site: SiteId,
    draft: Arc<Mutex<Draft>>,
    store: Arc<dyn DraftStore>,
    pipeline: Option<Pipeline>,
}

/// The sync half of a session: flags + clock, and the engine around them.
struct Pipeline {
    session: Arc<SyncSession>,
    engine: Arc<AutoSync>,
}

impl EditSession {
    /// Open a local-only session: edits persist, nothing ever syncs.
    pub fn open(site: SiteId, store: Arc<dyn DraftStore>) -> Result<Self> {
        let draft = store.get(&site)?.unwrap_or_default();
        Ok(Self {
            site,
            draft: Arc::new(Mutex::new(draft)),
            store,
            pipeline: None,
        })
    }

    /// Open a session wired to a remote authority.
    ///
    /// Loads the stored draft (or an empty one), arms the debounce clock,
    /// and starts the auto-sync loop. The initial population is not an
    /// edit: nothing is written back and nothing becomes sync-eligible
    /// until the first real mutation.
    pub fn open_with_sync(
        site: SiteId,
        store: Arc<dyn DraftStore>,
        service: Arc<dyn SyncService>,
        config: SyncConfig,
    ) -> Result<Self> {
        let draft = Arc::new(Mutex::new(store.get(&site)?.unwrap_or_default()));
        let session = Arc::new(SyncSession::new(&config));
        let engine = AutoSync::new(
            site.clone(),
            Arc::clone(&store),
            service,
            Arc::clone(&session),
            config,
        );

        session.restart_clock();
        engine.ensure_started();

        // Server-resolved drafts become the session baseline as they
        // arrive; pushing them into visible fields stays a host decision
        // via subscribe_applied().
        let baseline = Arc::clone(&draft);
        let mut applied = engine.subscribe_applied();
        tokio::spawn(async move {
            while applied.changed().await.is_ok() {
                let resolved = applied.borrow_and_update().clone();
                if let Some(resolved) = resolved {
                    *baseline.lock().unwrap_or_else(PoisonError::into_inner) = resolved;
                }
            }
        });

        Ok(Self {
            site,
            draft,
            store,
            pipeline: Some(Pipeline { session, engine }),
        })
    }

    /// The site this session edits.
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Snapshot of the current baseline draft.
    pub fn draft(&self) -> Draft {
        self.draft
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update the site title.
    pub async fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        self.apply(move |draft| draft.title = title).await
    }

    /// Update the site description.
    pub async fn set_description(&self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        self.apply(move |draft| draft.description = description).await
    }

    /// Replace the block document produced by the external editor.
    pub async fn set_content(&self, content: serde_json::Value) -> Result<()> {
        self.apply(move |draft| draft.content = content).await
    }

    /// Run one sync round-trip right now, outside the loop cadence.
    ///
    /// Returns `None` for local-only sessions and when there is nothing
    /// stored to sync.
    pub async fn sync_now(&self) -> Option<SyncOutcome> {
        let pipeline = self.pipeline.as_ref()?;
        let outcome = pipeline.engine.sync_now().await?;
        if outcome.resolved_from == ResolvedFrom::Server {
            *self.draft.lock().unwrap_or_else(PoisonError::into_inner) = outcome.draft.clone();
        }
        Some(outcome)
    }

    /// Subscribe to drafts the server overrode, for hosts that refresh
    /// their editing surface. `None` for local-only sessions.
    pub fn subscribe_applied(&self) -> Option<watch::Receiver<Option<Draft>>> {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.engine.subscribe_applied())
    }

    async fn apply(&self, mutate: impl FnOnce(&mut Draft)) -> Result<()> {
        let snapshot = {
            let mut draft = self.draft.lock().unwrap_or_else(PoisonError::into_inner);
            mutate(&mut draft);
            draft.touch();
            draft.clone()
        };

        // Durability first: the store write completes before any sync
        // machinery is touched.
        self.store.put(&self.site, &snapshot)?;

        if let Some(pipeline) = &self.pipeline {
            pipeline.session.flags().mark_modified();
            if pipeline.session.flags().sync_due() {
                // A window already elapsed while the user kept typing;
                // run the round-trip now instead of waiting for a tick.
                self.sync_now().await;
            }
        }

        Ok(())
    }
}
