//! Draft store implementation

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::models::{Draft, SiteId};
use crate::util::unix_timestamp_now;

use super::Database;

/// Trait for per-site draft persistence.
///
/// The store holds at most one draft per site, keyed `site:<siteId>`.
/// Writes overwrite the whole draft; merge decisions belong to the sync
/// layer, never to storage.
pub trait DraftStore: Send + Sync {
    /// Load the draft stored for a site, if any.
    ///
    /// Stored data that no longer parses is treated as absent, not as an
    /// error: the editor falls back to an empty draft instead of refusing
    /// to open.
    fn get(&self, site: &SiteId) -> Result<Option<Draft>>;

    /// Overwrite the stored draft for a site.
    fn put(&self, site: &SiteId, draft: &Draft) -> Result<()>;
}

/// SQLite implementation of `DraftStore`
#[derive(Clone)]
pub struct SqliteDraftStore {
    db: Arc<Database>,
}

impl SqliteDraftStore {
    /// Create a new store over the given database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl DraftStore for SqliteDraftStore {
    fn get(&self, site: &SiteId) -> Result<Option<Draft>> {
        let raw: Option<String> = self
            .db
            .lock()
            .query_row(
                "SELECT value FROM drafts WHERE key = ?",
                params![site.storage_key()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(draft) => Ok(Some(draft)),
            Err(error) => {
                tracing::warn!("Discarding malformed stored draft for {site}: {error}");
                Ok(None)
            }
        }
    }

    fn put(&self, site: &SiteId, draft: &Draft) -> Result<()> {
        let serialized = serde_json::to_string(draft)?;
        self.db.lock().execute(
            "INSERT OR REPLACE INTO drafts (key, value, written_at) VALUES (?, ?, ?)",
            params![site.storage_key(), serialized, unix_timestamp_now()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn setup() -> SqliteDraftStore {
        SqliteDraftStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn site(slug: &str) -> SiteId {
        SiteId::new(slug).unwrap()
    }

    #[test]
    fn get_missing_returns_none() {
        let store = setup();
        assert_eq!(store.get(&site("nowhere")).unwrap(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = setup();
        let draft = Draft {
            title: "Hello".to_string(),
            description: "A place".to_string(),
            last_updated: 7,
            content: serde_json::json!({"blocks": [{"type": "paragraph"}]}),
        };

        store.put(&site("garden"), &draft).unwrap();
        assert_eq!(store.get(&site("garden")).unwrap(), Some(draft));
    }

    #[test]
    fn put_overwrites_previous_value() {
        let store = setup();
        let mut draft = Draft::default();
        draft.title = "first".to_string();
        store.put(&site("garden"), &draft).unwrap();

        draft.title = "second".to_string();
        store.put(&site("garden"), &draft).unwrap();

        let loaded = store.get(&site("garden")).unwrap().unwrap();
        assert_eq!(loaded.title, "second");
    }

    #[test]
    fn sites_do_not_collide() {
        let store = setup();
        let mut a = Draft::default();
        a.title = "a".to_string();
        let mut b = Draft::default();
        b.title = "b".to_string();

        store.put(&site("alpha"), &a).unwrap();
        store.put(&site("beta"), &b).unwrap();

        assert_eq!(store.get(&site("alpha")).unwrap().unwrap().title, "a");
        assert_eq!(store.get(&site("beta")).unwrap().unwrap().title, "b");
    }

    #[test]
    fn malformed_row_reads_as_absent() {
        let store = setup();
        store
            .db
            .lock()
            .execute(
                "INSERT INTO drafts (key, value, written_at) VALUES (?, ?, ?)",
                params!["site:broken", "{not json", 0],
            )
            .unwrap();

        assert_eq!(store.get(&site("broken")).unwrap(), None);
    }
}
