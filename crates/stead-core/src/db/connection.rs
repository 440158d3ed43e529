//! Database connection management

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::error::Result;

use super::migrations;

/// SQLite handle behind the local draft store.
///
/// The connection is guarded by a mutex so the edit session and the
/// background sync loop can share one database. Writes through this handle
/// complete before the call returns; there is no write-behind.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist.
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let database = Self {
            conn: Mutex::new(conn),
        };
        database.configure()?;
        database.migrate()?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let database = Self {
            conn: Mutex::new(conn),
        };
        database.configure()?;
        database.migrate()?;
        Ok(database)
    }

    /// Configure SQLite for local-store usage
    fn configure(&self) -> Result<()> {
        let conn = self.lock();
        // WAL keeps concurrent readers out of the writers' way; in-memory
        // databases reject it, which is fine to ignore.
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        migrations::run(&self.lock())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
