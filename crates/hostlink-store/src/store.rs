//! Key/value store

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::Result;

pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref())?;

        // WAL mode so readers on other threads don't block the writer
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        tracing::info!(path = %path.as_ref().display(), "Opened store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self.with_connection(|conn| {
            Ok(conn
                .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?)
        })?;

        raw.map(|s| serde_json::from_str::<Value>(&s).map_err(StorageError::from))
            .transpose()
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        let updated_at = Utc::now().to_rfc3339();

        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, encoded, updated_at],
            )?;
            Ok(())
        })?;

        tracing::debug!(key = %key, "Stored value");

        Ok(())
    }

    /// Remove `key`. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM entries WHERE key = ?1", [key])?)
        })?;

        Ok(removed > 0)
    }

    /// All keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }

    /// Remove every entry
    pub fn purge(&self) -> Result<usize> {
        let removed =
            self.with_connection(|conn| Ok(conn.execute("DELETE FROM entries", [])?))?;

        tracing::info!(removed, "Purged store");

        Ok(removed)
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
