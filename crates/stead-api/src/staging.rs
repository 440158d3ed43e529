//! Staging storage
//!
//! One row per site: the serialized request envelope of the most recent
//! winning sync, plus the timestamp it won with. The blob is opaque here;
//! arbitration happens in the route handler and resolution on the client.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

/// Staging row for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRow {
    /// Serialized request envelope (`{"localData": ...}`)
    pub data: String,
    /// Unix seconds the staging data last won
    pub last_update: i64,
}

/// SQLite-backed staging store.
pub struct StagingStore {
    conn: Mutex<Connection>,
}

impl StagingStore {
    /// Open the staging database, creating schema as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path)
            .map_err(|error| AppError::internal(format!("open staging db: {error}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|error| AppError::internal(format!("open staging db: {error}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), AppError> {
        self.lock()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS site_sync (
                     site TEXT PRIMARY KEY,
                     staging TEXT NOT NULL,
                     last_update INTEGER NOT NULL
                 );",
            )
            .map_err(|error| AppError::internal(format!("init staging schema: {error}")))
    }

    /// Load the staging row for a site, if any.
    pub fn get(&self, site: &str) -> Result<Option<StagingRow>, AppError> {
        self.lock()
            .query_row(
                "SELECT staging, last_update FROM site_sync WHERE site = ?",
                params![site],
                |row| {
                    Ok(StagingRow {
                        data: row.get(0)?,
                        last_update: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(|error| AppError::internal(format!("read staging row: {error}")))
    }

    /// Store the winning envelope for a site, replacing any prior one.
    pub fn put(&self, site: &str, data: &str, last_update: i64) -> Result<(), AppError> {
        self.lock()
            .execute(
                "INSERT OR REPLACE INTO site_sync (site, staging, last_update) VALUES (?, ?, ?)",
                params![site, data, last_update],
            )
            .map_err(|error| AppError::internal(format!("write staging row: {error}")))?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn get_missing_returns_none() {
        let store = StagingStore::open_in_memory().unwrap();
        assert_eq!(store.get("garden").unwrap(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = StagingStore::open_in_memory().unwrap();
        store.put("garden", r#"{"localData":{}}"#, 42).unwrap();

        let row = store.get("garden").unwrap().unwrap();
        assert_eq!(row.data, r#"{"localData":{}}"#);
        assert_eq!(row.last_update, 42);
    }

    #[test]
    fn put_replaces_previous_row() {
        let store = StagingStore::open_in_memory().unwrap();
        store.put("garden", "first", 1).unwrap();
        store.put("garden", "second", 2).unwrap();

        let row = store.get("garden").unwrap().unwrap();
        assert_eq!(row.data, "second");
        assert_eq!(row.last_update, 2);
    }
}
