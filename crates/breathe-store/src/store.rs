//! SQLite-backed store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::schema;

/// How long a writer waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based key/value store.
///
/// Several processes (the CLI, a long-running widget host) may open the same
/// file; WAL mode plus a busy timeout lets them share it, and every write is
/// a single statement or transaction.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// When a value was last written, if it exists.
    pub fn updated_at(&self, namespace: &str, key: &str) -> Result<Option<OffsetDateTime>> {
        let conn = self.conn()?;
        let ts: Option<i64> = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(ts.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok()))
    }

    /// Remove every entry in a namespace, returning how many were deleted.
    pub fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM kv WHERE namespace = ?1", [namespace])?;
        debug!("Cleared {} entries from namespace {}", deleted, namespace);
        Ok(deleted)
    }
}

impl KeyValueStore for Store {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                rusqlite::params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![namespace, key, value, now],
        )?;
        Ok(())
    }

    fn put_many(&self, namespace: &str, entries: &[(&str, &str)]) -> Result<()> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(namespace, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
            )?;
            for (key, value) in entries {
                stmt.execute(rusqlite::params![namespace, key, value, now])?;
            }
        }
        tx.commit()?;
        debug!("Wrote {} entries to namespace {}", entries.len(), namespace);
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
            rusqlite::params![namespace, key],
        )?;
        Ok(deleted > 0)
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE namespace = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map([namespace], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.keys("anything").unwrap().is_empty());
    }

    #[test]
    fn test_put_and_get() {
        let store = Store::open_in_memory().unwrap();
        store.put("prefs", "is_us_aqi", "true").unwrap();
        assert_eq!(
            store.get("prefs", "is_us_aqi").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(store.get("prefs", "missing").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let store = Store::open_in_memory().unwrap();
        store.put("ns", "k", "old").unwrap();
        store.put("ns", "k", "new").unwrap();
        assert_eq!(store.get("ns", "k").unwrap().as_deref(), Some("new"));
        assert_eq!(store.keys("ns").unwrap().len(), 1);
    }

    #[test]
    fn test_put_many_and_keys_sorted() {
        let store = Store::open_in_memory().unwrap();
        store
            .put_many("cache", &[("zones", "[]"), ("aqi", "[]")])
            .unwrap();
        assert_eq!(store.keys("cache").unwrap(), vec!["aqi", "zones"]);
        assert!(store.updated_at("cache", "zones").unwrap().is_some());
    }

    #[test]
    fn test_remove_and_clear_namespace() {
        let store = Store::open_in_memory().unwrap();
        store.put_many("w", &[("a", "1"), ("b", "2")]).unwrap();
        store.put("other", "a", "1").unwrap();

        assert!(store.remove("w", "a").unwrap());
        assert!(!store.remove("w", "a").unwrap());
        assert_eq!(store.clear_namespace("w").unwrap(), 1);
        assert_eq!(store.get("other", "a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_two_handles_share_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("breathe.db");

        let writer = Store::open(&path).unwrap();
        let reader = Store::open(&path).unwrap();

        writer.put("prefs", "pinned_ids", "[\"a\"]").unwrap();
        assert_eq!(
            reader.get("prefs", "pinned_ids").unwrap().as_deref(),
            Some("[\"a\"]")
        );
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let store = std::sync::Arc::new(Store::open_in_memory().unwrap());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                store.put("ns", &format!("k{i}"), "v").unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.keys("ns").unwrap().len(), 8);
    }
}
