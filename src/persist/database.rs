//! SQLite connection handle.

use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{PersistError, Result};

/// One SQLite connection, shareable across request tasks as `Arc<Database>`.
///
/// Every operation locks the connection for its duration and blocks the
/// calling thread on I/O. Pooling is left to the caller.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (creating if needed) the database file described by `config`.
    ///
    /// Parent directories are created, the journal is switched to WAL and the
    /// busy timeout is applied.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path).map_err(PersistError::from)?;
        // journal_mode answers with a row, so it cannot go through execute.
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(PersistError::from)?;
        conn.busy_timeout(config.busy_timeout()).map_err(PersistError::from)?;

        debug!(path = %config.path.display(), journal_mode = %mode, "database opened");
        Ok(Self::from_connection(conn))
    }

    /// A private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, PersistError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Exclusive access to the underlying connection.
    ///
    /// A panic while the lock was held does not make the connection unusable,
    /// so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a batch of `;`-separated statements.
    pub fn execute_batch(&self, sql: &str) -> Result<(), PersistError> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }
}
