//! Local persistence for breathe air-quality data.
//!
//! This crate provides the key/value primitives the sync engine and the
//! widget bridge share. The SQLite [`Store`] is safe to open from several
//! processes at once, which is how the engine and an independently
//! scheduled widget host exchange state.
//!
//! # Features
//!
//! - [`KeyValueStore`] trait with SQLite and in-memory implementations
//! - Atomic multi-key writes
//! - [`CacheStore`] for the offline zones/readings snapshot
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use breathe_store::{CacheStore, Store};
//!
//! let store = Arc::new(Store::open_default()?);
//! let cache = CacheStore::new(store);
//! if let Some(snapshot) = cache.read() {
//!     println!("{} cached zones", snapshot.zones.len());
//! }
//! # Ok::<(), breathe_store::Error>(())
//! ```

mod cache;
mod error;
mod kv;
mod schema;
mod store;

pub use cache::{CACHE_NAMESPACE, CacheStore, CachedSnapshot, READINGS_KEY, ZONES_KEY};
pub use error::{Error, Result};
pub use kv::{KeyValueStore, MemoryStore, get_json, put_json};
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/breathe/breathe.db`
/// - macOS: `~/Library/Application Support/breathe/breathe.db`
/// - Windows: `C:\Users\<user>\AppData\Local\breathe\breathe.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("breathe")
        .join("breathe.db")
}
