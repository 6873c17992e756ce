//! Mock air-quality source for testing.
//!
//! [`MockSource`] implements [`AqiSource`] without any network, so the sync
//! engine and the widget bridge can be exercised deterministically.
//!
//! # Features
//!
//! - **Failure injection**: fail the catalog, specific zones, or the next N calls
//! - **Latency simulation**: global or per-zone delays (works with paused tokio time)
//! - **Call log**: the order in which zones were fetched

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use breathe_types::{Reading, Zone};

use crate::error::{Error, Result};
use crate::traits::AqiSource;

/// A scriptable in-memory [`AqiSource`].
///
/// # Example
///
/// ```
/// use breathe_core::{AqiSource, MockSource};
///
/// #[tokio::main]
/// async fn main() {
///     let source = MockSource::builder()
///         .zone("a", "Alpha", 42)
///         .zone("b", "Bravo", 10)
///         .failing_zone("b")
///         .build();
///
///     assert_eq!(source.list_zones().await.unwrap().len(), 2);
///     assert_eq!(source.zone_aqi("a").await.unwrap().index_value, 42);
///     assert!(source.zone_aqi("b").await.is_err());
/// }
/// ```
pub struct MockSource {
    zones: RwLock<Vec<Zone>>,
    readings: RwLock<HashMap<String, Reading>>,
    failing_zones: RwLock<HashSet<String>>,
    zone_latency: RwLock<HashMap<String, Duration>>,
    catalog_fails: AtomicBool,
    /// Simulated latency for every call in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Calls left to fail with a retryable error before behaving normally.
    remaining_failures: AtomicU32,
    catalog_calls: AtomicU32,
    zone_calls: AtomicU32,
    call_log: RwLock<Vec<String>>,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("catalog_calls", &self.catalog_calls.load(Ordering::Relaxed))
            .field("zone_calls", &self.zone_calls.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Create an empty source with no zones.
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(Vec::new()),
            readings: RwLock::new(HashMap::new()),
            failing_zones: RwLock::new(HashSet::new()),
            zone_latency: RwLock::new(HashMap::new()),
            catalog_fails: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            remaining_failures: AtomicU32::new(0),
            catalog_calls: AtomicU32::new(0),
            zone_calls: AtomicU32::new(0),
            call_log: RwLock::new(Vec::new()),
        }
    }

    /// Start building a source.
    pub fn builder() -> MockSourceBuilder {
        MockSourceBuilder::default()
    }

    /// Replace the zone catalog.
    pub async fn set_zones(&self, zones: Vec<Zone>) {
        *self.zones.write().await = zones;
    }

    /// Set (or replace) the reading served for its zone.
    pub async fn set_reading(&self, reading: Reading) {
        self.readings
            .write()
            .await
            .insert(reading.zone_id.clone(), reading);
    }

    /// Make a zone's reading fetch fail (or succeed again).
    pub async fn set_zone_failing(&self, zone_id: &str, failing: bool) {
        let mut failing_zones = self.failing_zones.write().await;
        if failing {
            failing_zones.insert(zone_id.to_string());
        } else {
            failing_zones.remove(zone_id);
        }
    }

    /// Make the catalog fetch fail (or succeed again).
    pub fn set_catalog_failing(&self, failing: bool) {
        self.catalog_fails.store(failing, Ordering::Relaxed);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Delay one zone's reading fetch by `latency`, on top of the global delay.
    pub async fn set_zone_latency(&self, zone_id: &str, latency: Duration) {
        self.zone_latency
            .write()
            .await
            .insert(zone_id.to_string(), latency);
    }

    /// Fail the next `count` calls with a retryable error.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Number of catalog fetches so far.
    pub fn catalog_calls(&self) -> u32 {
        self.catalog_calls.load(Ordering::Relaxed)
    }

    /// Number of reading fetches so far.
    pub fn zone_calls(&self) -> u32 {
        self.zone_calls.load(Ordering::Relaxed)
    }

    /// Zone ids in the order their reading fetches started.
    pub async fn call_log(&self) -> Vec<String> {
        self.call_log.read().await.clone()
    }

    /// Forget recorded calls.
    pub async fn reset_calls(&self) {
        self.catalog_calls.store(0, Ordering::Relaxed);
        self.zone_calls.store(0, Ordering::Relaxed);
        self.call_log.write().await.clear();
    }

    async fn simulate_latency(&self, extra: Option<Duration>) {
        let latency = Duration::from_millis(self.latency_ms.load(Ordering::Relaxed))
            + extra.unwrap_or_default();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_transient_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AqiSource for MockSource {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.catalog_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency(None).await;

        if self.take_transient_failure() {
            return Err(Error::timeout("list_zones", Duration::from_secs(10)));
        }
        if self.catalog_fails.load(Ordering::Relaxed) {
            return Err(Error::api(503, "Mock catalog failure"));
        }
        Ok(self.zones.read().await.clone())
    }

    async fn zone_aqi(&self, zone_id: &str) -> Result<Reading> {
        self.zone_calls.fetch_add(1, Ordering::Relaxed);
        self.call_log.write().await.push(zone_id.to_string());

        let extra = self.zone_latency.read().await.get(zone_id).copied();
        self.simulate_latency(extra).await;

        if self.take_transient_failure() {
            return Err(Error::timeout("zone_aqi", Duration::from_secs(10)));
        }
        if self.failing_zones.read().await.contains(zone_id) {
            return Err(Error::api(500, format!("Mock failure for zone {zone_id}")));
        }
        self.readings
            .read()
            .await
            .get(zone_id)
            .cloned()
            .ok_or_else(|| Error::unknown_zone(zone_id))
    }
}

/// Builder for [`MockSource`].
#[derive(Debug, Default)]
pub struct MockSourceBuilder {
    zones: Vec<Zone>,
    readings: HashMap<String, Reading>,
    failing_zones: HashSet<String>,
    catalog_fails: bool,
    latency: Duration,
}

impl MockSourceBuilder {
    /// Add a zone with a simple reading of `index_value`.
    #[must_use]
    pub fn zone(mut self, id: &str, name: &str, index_value: i32) -> Self {
        self.zones.push(Zone::new(id, name));
        let mut reading = Reading::new(id, index_value);
        reading.zone_name = name.to_string();
        self.readings.insert(id.to_string(), reading);
        self
    }

    /// Add a zone without a reading (fetches fail with `UnknownZone`).
    #[must_use]
    pub fn zone_without_reading(mut self, id: &str, name: &str) -> Self {
        self.zones.push(Zone::new(id, name));
        self
    }

    /// Serve a custom reading for its zone.
    #[must_use]
    pub fn reading(mut self, reading: Reading) -> Self {
        self.readings.insert(reading.zone_id.clone(), reading);
        self
    }

    /// Make a zone's reading fetch fail.
    #[must_use]
    pub fn failing_zone(mut self, id: &str) -> Self {
        self.failing_zones.insert(id.to_string());
        self
    }

    /// Make the catalog fetch fail.
    #[must_use]
    pub fn failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    /// Delay every call.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn build(self) -> MockSource {
        let mut source = MockSource::new();
        source.zones = RwLock::new(self.zones);
        source.readings = RwLock::new(self.readings);
        source.failing_zones = RwLock::new(self.failing_zones);
        source.catalog_fails = AtomicBool::new(self.catalog_fails);
        source.set_latency(self.latency);
        source
    }
}
