//! Offline fallback snapshot of the last full sync.

use std::sync::Arc;

use breathe_types::{Reading, Zone};
use tracing::debug;

use crate::error::Result;
use crate::kv::KeyValueStore;

/// Namespace holding the cache entries.
pub const CACHE_NAMESPACE: &str = "breathe_cache";
/// Key of the serialized zone catalog.
pub const ZONES_KEY: &str = "cached_zones";
/// Key of the serialized readings.
pub const READINGS_KEY: &str = "cached_aqi";

/// The last zones/readings pair written to the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedSnapshot {
    pub zones: Vec<Zone>,
    pub readings: Vec<Reading>,
}

/// Durable zones/readings snapshot used to paint before the network answers.
#[derive(Clone)]
pub struct CacheStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist both collections in one atomic write.
    pub fn write(&self, zones: &[Zone], readings: &[Reading]) -> Result<()> {
        let zones_json = serde_json::to_string(zones)?;
        let readings_json = serde_json::to_string(readings)?;
        self.kv.put_many(
            CACHE_NAMESPACE,
            &[(ZONES_KEY, &zones_json), (READINGS_KEY, &readings_json)],
        )?;
        debug!(
            "Cached {} zones and {} readings",
            zones.len(),
            readings.len()
        );
        Ok(())
    }

    /// The last written pair, or `None` when never written or unreadable.
    ///
    /// A corrupt entry counts as a miss.
    pub fn read(&self) -> Option<CachedSnapshot> {
        match self.try_read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Ignoring unreadable cache: {}", e);
                None
            }
        }
    }

    fn try_read(&self) -> Result<Option<CachedSnapshot>> {
        let Some(zones) = self.kv.get(CACHE_NAMESPACE, ZONES_KEY)? else {
            return Ok(None);
        };
        let Some(readings) = self.kv.get(CACHE_NAMESPACE, READINGS_KEY)? else {
            return Ok(None);
        };

        Ok(Some(CachedSnapshot {
            zones: serde_json::from_str(&zones)?,
            readings: serde_json::from_str(&readings)?,
        }))
    }

    /// Drop the cached snapshot.
    pub fn clear(&self) -> Result<()> {
        self.kv.remove(CACHE_NAMESPACE, ZONES_KEY)?;
        self.kv.remove(CACHE_NAMESPACE, READINGS_KEY)?;
        Ok(())
    }
}
