//! Namespaced key/value storage.
//!
//! Every persisted piece of state (pins, preferences, cache, widget blobs)
//! goes through [`KeyValueStore`], so callers depend on these operations
//! rather than on SQLite.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A namespaced string key/value store.
///
/// Implementations must make each call atomic: a reader never observes a
/// partially written value, and [`put_many`](KeyValueStore::put_many)
/// commits all entries or none.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value.
    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Insert or replace several values in one atomic write.
    fn put_many(&self, namespace: &str, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove a value, returning whether it existed.
    fn remove(&self, namespace: &str, key: &str) -> Result<bool>;

    /// List the keys in a namespace, sorted.
    fn keys(&self, namespace: &str) -> Result<Vec<String>>;
}

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    namespace: &str,
    key: &str,
) -> Result<Option<T>> {
    match kv.get(namespace, key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub fn put_json<T: Serialize + ?Sized>(
    kv: &dyn KeyValueStore,
    namespace: &str,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    kv.put(namespace, key, &raw)
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| Error::LockPoisoned)?;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::LockPoisoned)?;
        entries.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn put_many(&self, namespace: &str, items: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::LockPoisoned)?;
        for (key, value) in items {
            entries.insert((namespace.to_string(), (*key).to_string()), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| Error::LockPoisoned)?;
        Ok(entries
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Error::LockPoisoned)?;
        Ok(entries
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, key)| key.clone())
            .collect())
    }
}
