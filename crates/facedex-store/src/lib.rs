//! facedex-store — SQLite-backed local cache.
//!
//! Holds the three mirrored collections as JSON strings in a single
//! key/value table, one row per slot.

use facedex_core::{CacheError, LocalCache, Slot};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_slots (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Local cache stored in a SQLite database file.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create the cache at `path`, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(CacheError::backend)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(CacheError::backend)?;
        tracing::debug!(path = %path.display(), "opened cache database");
        Self::init(conn)
    }

    /// Open a cache that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory().map_err(CacheError::backend)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(SCHEMA).map_err(CacheError::backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LocalCache for SqliteCache {
    fn read(&self, slot: Slot) -> Result<Option<String>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.query_row(
            "SELECT value FROM cache_slots WHERE key = ?1",
            params![slot.key()],
            |row| row.get(0),
        )
        .optional()
        .map_err(CacheError::backend)
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT INTO cache_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![slot.key(), value, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(CacheError::backend)?;
        tracing::trace!(slot = slot.key(), bytes = value.len(), "cache slot written");
        Ok(())
    }
}
