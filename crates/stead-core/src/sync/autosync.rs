//! Auto-sync scheduling

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::config::SyncConfig;
use crate::db::DraftStore;
use crate::models::{Draft, SiteId};

use super::client::{SyncOutcome, SyncService};
use super::protocol::ResolvedFrom;
use super::session::SyncSession;

/// Sync engine for one editor session.
///
/// Owns the store handle, the remote transport, and the session state.
/// The polling loop fires at a fixed cadence and runs a round-trip once
/// the session flags license one; hosts can also run a round-trip
/// directly through [`AutoSync::sync_now`] to short-circuit the cadence.
///
/// Attempts are serialized per debounce window by the flags, not by a
/// mutex: if the flags are raised again while a round-trip is still in
/// flight, an overlapping attempt is possible. Accepted: the
/// server arbitrates whole drafts, so overlap cannot corrupt state.
pub struct AutoSync {
    site: SiteId,
    store: Arc<dyn DraftStore>,
    service: Arc<dyn SyncService>,
    session: Arc<SyncSession>,
    config: SyncConfig,
    loop_started: AtomicBool,
    applied_tx: watch::Sender<Option<Draft>>,
}

impl AutoSync {
    pub fn new(
        site: SiteId,
        store: Arc<dyn DraftStore>,
        service: Arc<dyn SyncService>,
        session: Arc<SyncSession>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let (applied_tx, _) = watch::channel(None);
        Arc::new(Self {
            site,
            store,
            service,
            session,
            config,
            loop_started: AtomicBool::new(false),
            applied_tx,
        })
    }

    /// Subscribe to drafts the server overrode.
    ///
    /// Hosts that want their editing surface to follow a server decision
    /// watch this channel; nothing is pushed into the surface implicitly.
    pub fn subscribe_applied(&self) -> watch::Receiver<Option<Draft>> {
        self.applied_tx.subscribe()
    }

    /// Start the polling loop. Idempotent: only the first call spawns,
    /// so exactly one loop exists per session.
    pub fn ensure_started(self: &Arc<Self>) {
        if self.loop_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.config.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if engine.session.flags().sync_due() {
                    engine.sync_now().await;
                }
            }
        });
        tracing::debug!("Auto-sync loop started for {}", self.site);
    }

    /// Run one sync round-trip with the current stored draft.
    ///
    /// An absent draft makes this a no-op: there is nothing to sync, and
    /// the eligibility flags are left untouched. Otherwise the flags are
    /// consumed and the clock restarted before the exchange; a reachable
    /// server additionally resets them afterwards so the next window
    /// starts from the completed attempt.
    pub async fn sync_now(self: &Arc<Self>) -> Option<SyncOutcome> {
        let draft = match self.store.get(&self.site) {
            Ok(Some(draft)) => draft,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!("Skipping sync for {}: {error}", self.site);
                return None;
            }
        };

        self.session.flags().clear();
        self.session.restart_clock();

        let outcome = self.service.sync(&self.site, &draft).await;

        if outcome.resolved_from == ResolvedFrom::Server {
            if let Err(error) = self.store.put(&self.site, &outcome.draft) {
                tracing::warn!("Failed to persist server draft for {}: {error}", self.site);
            }
            self.applied_tx.send_replace(Some(outcome.draft.clone()));
        }

        if outcome.reached_server {
            self.session.flags().clear();
            self.session.restart_clock();
            self.ensure_started();
        }

        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::error::Result;

    use super::*;

    /// In-memory store for scheduling tests.
    #[derive(Default)]
    struct MemoryStore {
        drafts: Mutex<HashMap<String, Draft>>,
    }

    impl DraftStore for MemoryStore {
        fn get(&self, site: &SiteId) -> Result<Option<Draft>> {
            Ok(self.drafts.lock().unwrap().get(&site.storage_key()).cloned())
        }

        fn put(&self, site: &SiteId, draft: &Draft) -> Result<()> {
            self.drafts
                .lock()
                .unwrap()
                .insert(site.storage_key(), draft.clone());
            Ok(())
        }
    }

    /// Scripted transport that counts round-trips.
    struct StubService {
        calls: AtomicUsize,
        server_draft: Option<Draft>,
        reached_server: bool,
    }

    impl StubService {
        fn local_wins() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                server_draft: None,
                reached_server: true,
            }
        }

        fn server_wins(draft: Draft) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                server_draft: Some(draft),
                reached_server: true,
            }
        }

        fn unreachable() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                server_draft: None,
                reached_server: false,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SyncService for StubService {
        async fn sync(&self, _site: &SiteId, local: &Draft) -> SyncOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.server_draft {
                Some(draft) => SyncOutcome {
                    draft: draft.clone(),
                    resolved_from: ResolvedFrom::Server,
                    reached_server: true,
                },
                None => SyncOutcome {
                    draft: local.clone(),
                    resolved_from: ResolvedFrom::Local,
                    reached_server: self.reached_server,
                },
            }
        }
    }

    fn fast_config() -> SyncConfig {
        SyncConfig::default()
            .with_window(Duration::from_millis(40))
            .with_poll_interval(Duration::from_millis(10))
    }

    fn engine_with(
        service: Arc<StubService>,
        config: SyncConfig,
    ) -> (Arc<AutoSync>, Arc<MemoryStore>, Arc<SyncSession>, SiteId) {
        let site = SiteId::new("garden").unwrap();
        let store = Arc::new(MemoryStore::default());
        let session = Arc::new(SyncSession::new(&config));
        let engine = AutoSync::new(
            site.clone(),
            Arc::clone(&store) as Arc<dyn DraftStore>,
            service as Arc<dyn SyncService>,
            Arc::clone(&session),
            config,
        );
        (engine, store, session, site)
    }

    fn seeded_draft(title: &str) -> Draft {
        Draft {
            title: title.to_string(),
            description: String::new(),
            last_updated: 1,
            content: serde_json::Value::Null,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_does_not_sync_before_window_elapses() {
        let service = Arc::new(StubService::local_wins());
        let (engine, store, session, site) = engine_with(Arc::clone(&service), fast_config());
        store.put(&site, &seeded_draft("draft")).unwrap();

        engine.ensure_started();
        // Modified, but no window has elapsed yet.
        session.flags().mark_modified();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_syncs_once_when_due_and_rearms() {
        let service = Arc::new(StubService::local_wins());
        let (engine, store, session, site) = engine_with(Arc::clone(&service), fast_config());
        store.put(&site, &seeded_draft("draft")).unwrap();

        session.restart_clock();
        engine.ensure_started();
        session.flags().mark_modified();

        // One window plus a few polls: exactly one round-trip, and the
        // flags must not license another until the next window + edit.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(service.call_count(), 1);
        assert!(!session.flags().modified());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_needs_a_new_edit_for_the_next_round_trip() {
        let service = Arc::new(StubService::local_wins());
        let (engine, store, session, site) = engine_with(Arc::clone(&service), fast_config());
        store.put(&site, &seeded_draft("draft")).unwrap();

        session.restart_clock();
        engine.ensure_started();
        session.flags().mark_modified();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(service.call_count(), 1);

        // Second edit after the first round-trip: the rearmed clock has
        // elapsed by now, so the loop picks it up again.
        session.flags().mark_modified();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn absent_draft_makes_ticks_no_ops() {
        let service = Arc::new(StubService::local_wins());
        let (engine, _store, session, _site) = engine_with(Arc::clone(&service), fast_config());

        session.flags().mark_modified();
        session.flags().mark_sync_due();
        engine.ensure_started();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(service.call_count(), 0);
        // Eligibility survives; the first persisted draft will sync.
        assert!(session.flags().sync_due());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ensure_started_spawns_exactly_one_loop() {
        let service = Arc::new(StubService::local_wins());
        let (engine, store, session, site) = engine_with(Arc::clone(&service), fast_config());
        store.put(&site, &seeded_draft("draft")).unwrap();

        session.restart_clock();
        engine.ensure_started();
        engine.ensure_started();
        engine.ensure_started();
        session.flags().mark_modified();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_win_persists_and_broadcasts() {
        let server_draft = seeded_draft("server copy");
        let service = Arc::new(StubService::server_wins(server_draft.clone()));
        let (engine, store, _session, site) = engine_with(service, fast_config());
        store.put(&site, &seeded_draft("local copy")).unwrap();

        let mut applied = engine.subscribe_applied();
        let outcome = engine.sync_now().await.unwrap();

        assert_eq!(outcome.resolved_from, ResolvedFrom::Server);
        assert_eq!(store.get(&site).unwrap().unwrap(), server_draft);

        applied.changed().await.unwrap();
        assert_eq!(applied.borrow_and_update().clone(), Some(server_draft));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_server_keeps_local_and_store_untouched() {
        let service = Arc::new(StubService::unreachable());
        let (engine, store, _session, site) = engine_with(service, fast_config());
        let local = seeded_draft("mine");
        store.put(&site, &local).unwrap();

        let outcome = engine.sync_now().await.unwrap();
        assert_eq!(outcome.draft, local);
        assert!(!outcome.reached_server);
        assert_eq!(store.get(&site).unwrap().unwrap(), local);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_now_without_draft_is_a_no_op() {
        let service = Arc::new(StubService::local_wins());
        let (engine, _store, _session, _site) = engine_with(Arc::clone(&service), fast_config());

        assert!(engine.sync_now().await.is_none());
        assert_eq!(service.call_count(), 0);
    }
}
