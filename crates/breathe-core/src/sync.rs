//! The sync engine.
//!
//! [`SyncEngine`] fetches the zone catalog and per-zone readings, merges them
//! with the user's pins into a [`SyncSnapshot`], publishes every merge on a
//! watch channel, and keeps the offline cache and the widget in step.
//!
//! # Refresh order
//!
//! 1. Foreground refreshes with no data yet publish `is_loading = true`.
//! 2. The catalog is fetched. Only this failure is ever surfaced, and only
//!    for foreground refreshes.
//! 3. Pinned zones are fetched concurrently and published at once; loading
//!    ends here.
//! 4. Unpinned zones are fetched concurrently, merged and published, and the
//!    result is written to the cache.
//!
//! A zone whose fetch fails is left out of that cycle and logged.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use breathe_core::{MockSource, SyncEngine};
//! use breathe_store::MemoryStore;
//!
//! # #[tokio::main]
//! # async fn main() -> breathe_core::Result<()> {
//! let source = Arc::new(MockSource::builder().zone("a", "Alpha", 42).build());
//! let engine = SyncEngine::new(source, Arc::new(MemoryStore::new()));
//!
//! engine.toggle_pin("a")?;
//! engine.refresh(false).await?;
//!
//! let snapshot = engine.snapshot();
//! assert_eq!(snapshot.pinned_readings()[0].index_value, 42);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use breathe_store::{CacheStore, KeyValueStore};
use breathe_types::{Reading, Zone};

use crate::error::{Error, Result};
use crate::events::{EventDispatcher, EventReceiver, SyncEvent};
use crate::prefs::PinSet;
use crate::retry::{RetryConfig, with_retry};
use crate::snapshot::SyncSnapshot;
use crate::traits::AqiSource;
use crate::widget::{NoopNotifier, WidgetNotifier};

/// Default period of the background refresh loop.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Which zones a refresh fetches readings for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchScope {
    /// Pinned zones first, then every other zone in the catalog.
    #[default]
    FullCatalog,
    /// Pinned zones only.
    PinnedOnly,
}

/// Configuration for a [`SyncEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Period of the background refresh loop.
    pub refresh_interval: Duration,
    /// Which zones to fetch readings for.
    pub fetch_scope: FetchScope,
    /// Upper bound on reading fetches in flight at once.
    pub max_concurrent_fetches: usize,
    /// Retry policy for catalog and reading fetches.
    pub retry: RetryConfig,
    /// Event channel capacity.
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_scope: FetchScope::FullCatalog,
            max_concurrent_fetches: 16,
            retry: RetryConfig::none(),
            event_capacity: 100,
        }
    }
}

impl SyncConfig {
    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(Error::invalid_config("refresh_interval must be non-zero"));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(Error::invalid_config(
                "max_concurrent_fetches must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub background: bool,
    /// Zones in the fetched catalog.
    pub zones: usize,
    /// Pinned zones whose reading was fetched.
    pub pinned_fetched: usize,
    /// Unpinned zones whose reading was fetched.
    pub unpinned_fetched: usize,
    /// Zones whose reading fetch failed, in catalog order.
    pub failed: Vec<String>,
}

impl RefreshReport {
    /// Total readings merged by this pass.
    pub fn readings(&self) -> usize {
        self.pinned_fetched + self.unpinned_fetched
    }
}

/// Orchestrates fetching, merging, caching and publishing.
pub struct SyncEngine {
    source: Arc<dyn AqiSource>,
    kv: Arc<dyn KeyValueStore>,
    cache: CacheStore,
    config: SyncConfig,
    state: watch::Sender<SyncSnapshot>,
    search: watch::Sender<String>,
    events: EventDispatcher,
    notifier: Arc<dyn WidgetNotifier>,
    periodic: Mutex<Option<CancellationToken>>,
}

impl SyncEngine {
    /// Create an engine with the default configuration.
    pub fn new(source: Arc<dyn AqiSource>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(source, kv, SyncConfig::default())
    }

    /// Create an engine with a custom configuration.
    ///
    /// The persisted pins are loaded immediately; unreadable pins count as
    /// none.
    pub fn with_config(
        source: Arc<dyn AqiSource>,
        kv: Arc<dyn KeyValueStore>,
        config: SyncConfig,
    ) -> Self {
        let pins = PinSet::load_or_default(kv.as_ref());
        let (state, _) = watch::channel(SyncSnapshot::new(Vec::new(), Vec::new(), pins));
        let (search, _) = watch::channel(String::new());

        Self {
            cache: CacheStore::new(Arc::clone(&kv)),
            events: EventDispatcher::new(config.event_capacity),
            source,
            kv,
            config,
            state,
            search,
            notifier: Arc::new(NoopNotifier),
            periodic: Mutex::new(None),
        }
    }

    /// Route force-refresh requests from [`toggle_pin`](Self::toggle_pin)
    /// to a widget host.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn WidgetNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get the event dispatcher for subscribing to events.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribe to engine events.
    pub fn subscribe_events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    /// Watch every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.subscribe()
    }

    // ==================== Refresh ====================

    /// Run one refresh pass.
    ///
    /// Returns the catalog error if the catalog could not be fetched. A
    /// foreground failure is also recorded in the snapshot's `error`; a
    /// background failure leaves the snapshot untouched.
    pub async fn refresh(&self, background: bool) -> Result<RefreshReport> {
        self.events.send(SyncEvent::RefreshStarted { background });

        if !background && !self.state.borrow().has_data() {
            self.state.send_modify(|s| {
                s.set_loading(true);
                s.set_error(None);
            });
        }

        let catalog = match with_retry(&self.config.retry, "list_zones", || {
            self.source.list_zones()
        })
        .await
        {
            Ok(zones) => zones,
            Err(e) => {
                self.events.send(SyncEvent::CatalogFailed {
                    background,
                    error: e.to_string(),
                });
                if background {
                    warn!("Background catalog refresh failed: {}", e);
                } else {
                    warn!("Catalog refresh failed: {}", e);
                    self.state.send_modify(|s| {
                        s.set_loading(false);
                        s.set_error(Some(format!("Error: {e}")));
                    });
                }
                return Err(e);
            }
        };

        let pins = self.state.borrow().pinned_ids().clone();
        let (pinned, unpinned): (Vec<&Zone>, Vec<&Zone>) =
            catalog.iter().partition(|z| pins.contains(&z.id));
        let mut report = RefreshReport {
            background,
            zones: catalog.len(),
            ..Default::default()
        };
        debug!(
            "Catalog has {} zones ({} pinned)",
            catalog.len(),
            pinned.len()
        );

        self.state.send_modify(|s| {
            s.set_zones(catalog.clone());
            s.set_error(None);
        });

        let (pinned_ok, pinned_failed) = self.fetch_readings(&pinned).await;
        report.pinned_fetched = pinned_ok.len();
        report.failed.extend(pinned_failed);

        let final_readings = match self.config.fetch_scope {
            FetchScope::PinnedOnly => {
                self.state.send_modify(|s| {
                    s.set_readings(pinned_ok.clone());
                    s.set_loading(false);
                });
                pinned_ok
            }
            FetchScope::FullCatalog => {
                // unpinned zones keep last cycle's reading until their fetch lands
                {
                    let fetched: HashSet<&str> =
                        pinned_ok.iter().map(|r| r.zone_id.as_str()).collect();
                    let unpinned_ids: HashSet<&str> =
                        unpinned.iter().map(|z| z.id.as_str()).collect();
                    self.state.send_modify(|s| {
                        let kept: Vec<Reading> = s
                            .all_readings()
                            .iter()
                            .filter(|r| {
                                unpinned_ids.contains(r.zone_id.as_str())
                                    && !fetched.contains(r.zone_id.as_str())
                            })
                            .cloned()
                            .collect();
                        let merged = pinned_ok.iter().cloned().chain(kept).collect();
                        s.set_readings(merged);
                        s.set_loading(false);
                    });
                }

                let (unpinned_ok, unpinned_failed) = self.fetch_readings(&unpinned).await;
                report.unpinned_fetched = unpinned_ok.len();
                report.failed.extend(unpinned_failed);

                let complete: Vec<Reading> = pinned_ok.into_iter().chain(unpinned_ok).collect();
                self.state.send_modify(|s| s.set_readings(complete.clone()));
                complete
            }
        };

        self.write_cache(catalog, final_readings).await;

        info!(
            "Refresh complete: {} zones, {} readings, {} failed",
            report.zones,
            report.readings(),
            report.failed.len()
        );
        self.events.send(SyncEvent::RefreshCompleted {
            background,
            zones: report.zones,
            readings: report.readings(),
            failed: report.failed.len(),
        });

        Ok(report)
    }

    /// Fetch readings for `zones` concurrently, in catalog order.
    ///
    /// Returns the successful readings and the ids that failed.
    async fn fetch_readings(&self, zones: &[&Zone]) -> (Vec<Reading>, Vec<String>) {
        if zones.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let limit = self.config.max_concurrent_fetches.max(1);
        let ids: Vec<String> = zones.iter().map(|z| z.id.clone()).collect();
        let mut results: Vec<(usize, Result<Reading>)> = stream::iter(ids.into_iter().enumerate())
            .map(|(i, zone_id)| {
                let source = Arc::clone(&self.source);
                let retry = self.config.retry.clone();
                async move {
                    let result =
                        with_retry(&retry, "zone_aqi", || source.zone_aqi(&zone_id)).await;
                    (i, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;
        results.sort_by_key(|(i, _)| *i);

        let mut readings = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (i, result) in results {
            let zone_id = &zones[i].id;
            match result {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    warn!("Failed to fetch AQI for zone {}: {}", zone_id, e);
                    self.events.send(SyncEvent::ZoneFailed {
                        zone_id: zone_id.clone(),
                        error: e.to_string(),
                    });
                    failed.push(zone_id.clone());
                }
            }
        }
        (readings, failed)
    }

    /// Persist the merged result on the blocking pool; failures are logged.
    async fn write_cache(&self, zones: Vec<Zone>, readings: Vec<Reading>) {
        let cache = self.cache.clone();
        let result =
            tokio::task::spawn_blocking(move || cache.write(&zones, &readings)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to write cache: {}", e),
            Err(e) => warn!("Cache write task failed: {}", e),
        }
    }

    // ==================== Periodic refresh ====================

    /// Start the background refresh loop.
    ///
    /// Each tick runs `refresh(true)` as its own task, so an error or a
    /// panic in one tick is logged and the next tick still runs. Returns
    /// `false` without doing anything if a loop is already running.
    pub fn start_periodic_refresh(self: &Arc<Self>) -> bool {
        let token = {
            let mut periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
            if periodic.as_ref().is_some_and(|t| !t.is_cancelled()) {
                debug!("Periodic refresh already running");
                return false;
            }
            let token = CancellationToken::new();
            *periodic = Some(token.clone());
            token
        };

        let engine = Arc::downgrade(self);
        let period = self.config.refresh_interval;
        info!("Starting periodic refresh every {:?}", period);

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            timer.tick().await;
            let mut consecutive_failures = 0u32;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Periodic refresh stopped");
                        break;
                    }
                    _ = timer.tick() => {
                        let Some(tick_engine) = engine.upgrade() else {
                            debug!("Engine dropped, periodic refresh exiting");
                            break;
                        };
                        let tick = tokio::spawn(async move { tick_engine.refresh(true).await });
                        let failure = match tick.await {
                            Ok(Ok(report)) => {
                                debug!("Periodic refresh merged {} readings", report.readings());
                                None
                            }
                            Ok(Err(e)) => Some(e.to_string()),
                            Err(e) => Some(format!("refresh task failed: {e}")),
                        };

                        match failure {
                            None => consecutive_failures = 0,
                            Some(message) => {
                                consecutive_failures += 1;
                                if consecutive_failures <= 3 {
                                    warn!(
                                        "Periodic refresh failed: {} (attempt {})",
                                        message, consecutive_failures
                                    );
                                } else if consecutive_failures == 4 {
                                    error!(
                                        "Periodic refresh failed {} times in a row, will continue trying silently",
                                        consecutive_failures
                                    );
                                }
                            }
                        }
                    }
                }
            }
        });

        true
    }

    /// Stop the background refresh loop, returning whether one was running.
    ///
    /// A refresh already in flight finishes and merges normally.
    pub fn stop_periodic_refresh(&self) -> bool {
        let token = self
            .periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether the background refresh loop is running.
    pub fn is_periodic_running(&self) -> bool {
        self.periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    // ==================== Cache, pins, search ====================

    /// Paint the last cached state, filtered by the current pins.
    ///
    /// Meant for startup, before the first refresh. Returns `false` when
    /// there is no usable cache or the snapshot already holds data.
    pub fn load_from_cache(&self) -> bool {
        let Some(cached) = self.cache.read() else {
            debug!("No cached snapshot available");
            return false;
        };

        let mut applied = false;
        self.state.send_if_modified(|s| {
            if s.has_data() {
                return false;
            }
            let pins = s.pinned_ids().clone();
            *s = SyncSnapshot::new(cached.zones, cached.readings, pins);
            applied = true;
            true
        });

        if applied {
            let snapshot = self.state.borrow();
            info!(
                "Loaded {} zones and {} readings from cache",
                snapshot.zones().len(),
                snapshot.all_readings().len()
            );
        }
        applied
    }

    /// Pin or unpin a zone, returning whether it is now pinned.
    ///
    /// Pinned readings are re-derived from the readings already held (no
    /// network call), the pins are persisted, and the widget is asked to
    /// refresh. If persisting fails the toggle is rolled back.
    pub fn toggle_pin(&self, zone_id: &str) -> Result<bool> {
        let mut outcome = Ok(false);
        self.state.send_modify(|s| {
            let pinned = s.toggle_pin(zone_id);
            outcome = match s.pinned_ids().save(self.kv.as_ref()) {
                Ok(()) => Ok(pinned),
                Err(e) => {
                    s.toggle_pin(zone_id);
                    Err(e)
                }
            };
        });
        let pinned = outcome?;

        debug!(
            "{} zone {}",
            if pinned { "Pinned" } else { "Unpinned" },
            zone_id
        );
        self.events.send(SyncEvent::PinToggled {
            zone_id: zone_id.to_string(),
            pinned,
        });
        self.request_widget_refresh();
        Ok(pinned)
    }

    /// Ask the widget host to re-render.
    pub fn request_widget_refresh(&self) {
        self.notifier.request_force_refresh();
        self.events.send(SyncEvent::WidgetRefreshRequested);
    }

    /// Publish a new search query.
    pub fn on_search_query_changed(&self, query: &str) {
        self.search.send_replace(query.to_string());
    }

    pub fn search_query(&self) -> String {
        self.search.borrow().clone()
    }

    /// Watch the search query.
    pub fn subscribe_search(&self) -> watch::Receiver<String> {
        self.search.subscribe()
    }

    /// Zones matching the current search query.
    pub fn search_results(&self) -> Vec<Zone> {
        let query = self.search_query();
        self.state
            .borrow()
            .search(&query)
            .into_iter()
            .cloned()
            .collect()
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop_periodic_refresh();
    }
}
