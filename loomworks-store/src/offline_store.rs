//! Namespaced durable key-value store.
//!
//! One DuckDB table holds all three namespaces. Values are JSON. The
//! boolean `put`/`get`/`remove` forms implement the best-effort contract
//! the rest of the system relies on: failures are logged, never raised.

use crate::error::StoreResult;
use duckdb::{params, Connection};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Logical partition of the key-value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Last known entity collection snapshots.
    Cache,
    /// Pending mutation queue (and its dead-letter list).
    Queue,
    /// Form draft buffers.
    Drafts,
}

impl Namespace {
    fn as_str(&self) -> &'static str {
        match self {
            Namespace::Cache => "cache",
            Namespace::Queue => "queue",
            Namespace::Drafts => "drafts",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable key-value storage surviving application restarts.
#[derive(Clone)]
pub struct OfflineStore {
    conn: Arc<Mutex<Connection>>,
}

impl OfflineStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Writes a value, overwriting any previous value at the key.
    /// Failures are logged and reported as `false`.
    pub fn put(&self, ns: Namespace, key: &str, value: &serde_json::Value) -> bool {
        match self.try_put(ns, key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to persist {ns}/{key}: {e}");
                false
            }
        }
    }

    /// Reads a value. Returns `None` when absent or on read failure.
    pub fn get(&self, ns: Namespace, key: &str) -> Option<serde_json::Value> {
        match self.try_get(ns, key) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to read {ns}/{key}: {e}");
                None
            }
        }
    }

    /// Removes a value. Failures are logged and reported as `false`.
    pub fn remove(&self, ns: Namespace, key: &str) -> bool {
        match self.try_remove(ns, key) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to remove {ns}/{key}: {e}");
                false
            }
        }
    }

    /// Fallible write, for callers that need the error.
    pub fn try_put(&self, ns: Namespace, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        let value_json = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO offline_kv (namespace, key, value_json, updated_at) \
             VALUES (?, ?, ?, ?)",
            params![ns.as_str(), key, value_json, now_ms()],
        )?;
        Ok(())
    }

    /// Fallible read. `Ok(None)` means the key is absent.
    pub fn try_get(&self, ns: Namespace, key: &str) -> StoreResult<Option<serde_json::Value>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value_json FROM offline_kv WHERE namespace = ? AND key = ?",
            params![ns.as_str(), key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fallible remove. Removing an absent key is not an error.
    pub fn try_remove(&self, ns: Namespace, key: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM offline_kv WHERE namespace = ? AND key = ?",
            params![ns.as_str(), key],
        )?;
        Ok(())
    }

    /// Lists the keys present in a namespace.
    pub fn keys(&self, ns: Namespace) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT key FROM offline_kv WHERE namespace = ? ORDER BY key")?;
        let keys = stmt
            .query_map(params![ns.as_str()], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }

    /// Empties a namespace. Used only in explicit reset scenarios.
    pub fn clear_namespace(&self, ns: Namespace) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM offline_kv WHERE namespace = ?",
            params![ns.as_str()],
        )?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS offline_kv (
            namespace VARCHAR NOT NULL,
            key VARCHAR NOT NULL,
            value_json TEXT NOT NULL,
            updated_at BIGINT NOT NULL,
            PRIMARY KEY (namespace, key)
        );
        "#,
    )?;
    Ok(())
}
