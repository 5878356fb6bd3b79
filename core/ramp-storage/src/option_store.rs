//! Persistent option store backed by SQLite.
//!
//! Options are scoped by environment name, so staging and production can
//! share one database file in single-process setups and still never see
//! each other's values.

use crate::error::{StorageError, StorageResult};
use ramp_extension::{OptionStore, OptionStoreError};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Key → JSON option store for one environment.
pub struct SqliteOptionStore {
    conn: Mutex<Connection>,
    environment: String,
}

impl SqliteOptionStore {
    /// Opens (or creates) an option store at the given path.
    pub fn open(path: impl AsRef<Path>, environment: impl Into<String>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn, environment.into())
    }

    /// Opens an in-memory option store (for testing).
    pub fn open_in_memory(environment: impl Into<String>) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, environment.into())
    }

    fn with_connection(conn: Connection, environment: String) -> StorageResult<Self> {
        if environment.trim().is_empty() {
            return Err(StorageError::InvalidData("environment name is empty".into()));
        }
        let store = Self {
            conn: Mutex::new(conn),
            environment,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn().execute_batch(
            "
            CREATE TABLE IF NOT EXISTS options (
                environment TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (environment, key)
            );
            ",
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Environment this store is scoped to.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Reads an option.
    pub fn read(&self, key: &str) -> StorageResult<Option<Value>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM options WHERE environment = ?1 AND key = ?2",
                params![self.environment, key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s).map_err(StorageError::from))
            .transpose()
    }

    /// Writes an option, replacing any previous value.
    pub fn write(&self, key: &str, value: &Value) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT INTO options (environment, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(environment, key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%s', 'now')",
            params![self.environment, key, raw],
        )?;
        debug!(environment = %self.environment, key, "option written");
        Ok(())
    }

    /// Lists option keys of this environment, sorted.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT key FROM options WHERE environment = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![self.environment], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl OptionStore for SqliteOptionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, OptionStoreError> {
        Ok(self.read(key)?)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), OptionStoreError> {
        Ok(self.write(key, &value)?)
    }
}
