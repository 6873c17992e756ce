//! Home-screen widget projection.
//!
//! The widget runs on its own schedule and shares no memory with the
//! [`SyncEngine`](crate::SyncEngine). Its only channel is the key/value
//! store: pins and the standard flag are read from [`PREFS_NAMESPACE`], and
//! each widget instance keeps one JSON [`WidgetState`] blob under
//! [`WIDGET_NAMESPACE`]. Every tick fetches a single zone and rewrites the
//! whole blob in one write, so overlapping ticks only ever replace one
//! complete state with another.
//!
//! The engine signals pin changes through [`WidgetNotifier`]; the
//! store-backed [`WidgetSignal`] marks every instance `Loading` and raises a
//! force-refresh flag that [`WidgetHost`] polls.
//!
//! [`PREFS_NAMESPACE`]: crate::prefs::PREFS_NAMESPACE

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use breathe_store::{KeyValueStore, get_json, put_json};
use breathe_types::{AqiStandard, Pollutant, Reading};

use crate::aqi;
use crate::error::Result;
use crate::events::{EventReceiver, SyncEvent};
use crate::prefs::Preferences;
use crate::traits::AqiSource;

/// Namespace holding widget state blobs and the force-refresh flag.
pub const WIDGET_NAMESPACE: &str = "breathe_widget";
/// Key of the force-refresh flag.
pub const FORCE_REFRESH_KEY: &str = "force_refresh";

const STATE_KEY_PREFIX: &str = "state:";

/// Host-assigned widget instance id.
pub type WidgetId = u32;

fn state_key(id: WidgetId) -> String {
    format!("{STATE_KEY_PREFIX}{id}")
}

/// Render status of a widget instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    #[default]
    Loading,
    Success,
    Error,
    Empty,
}

impl fmt::Display for WidgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WidgetStatus::Loading => "Loading",
            WidgetStatus::Success => "Success",
            WidgetStatus::Error => "Error",
            WidgetStatus::Empty => "Empty",
        };
        f.write_str(s)
    }
}

/// Pollutant concentrations shown on the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantLevels {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub o3: Option<f64>,
}

impl PollutantLevels {
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            pm25: reading.concentration(Pollutant::Pm25),
            pm10: reading.concentration(Pollutant::Pm10),
            no2: reading.concentration(Pollutant::No2),
            so2: reading.concentration(Pollutant::So2),
            co: reading.concentration(Pollutant::Co),
            o3: reading.concentration(Pollutant::O3),
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::So2 => self.so2,
            Pollutant::Co => self.co,
            Pollutant::O3 => self.o3,
        }
    }
}

/// Persisted projection of one widget instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetState {
    /// Position among the sorted pinned ids.
    pub cursor: usize,
    pub zone_id: Option<String>,
    pub zone_name: Option<String>,
    pub index_value: Option<i32>,
    pub us_index_value: Option<i32>,
    pub us_aqi_flag: bool,
    pub levels: PollutantLevels,
    /// `"Source: <provider>"`.
    pub source_label: Option<String>,
    pub total_pinned_count: usize,
    pub status: WidgetStatus,
    /// Unix seconds of the last write.
    pub updated_at: Option<i64>,
}

impl WidgetState {
    pub fn standard(&self) -> AqiStandard {
        AqiStandard::from_us_flag(self.us_aqi_flag)
    }

    /// Index to render under the stored standard, if a zone was ever shown.
    pub fn display_index(&self) -> Option<i32> {
        let national = self.index_value?;
        if !self.us_aqi_flag {
            return Some(national);
        }
        Some(self.us_index_value.unwrap_or_else(|| match self.levels.pm25 {
            Some(pm25) if pm25 > 0.0 => aqi::concentration_to_us_index(pm25),
            _ => 0,
        }))
    }

    fn apply_reading(&mut self, reading: &Reading, standard: AqiStandard, total: usize) {
        self.zone_id = Some(reading.zone_id.clone());
        self.zone_name = Some(reading.zone_name.clone());
        self.index_value = Some(reading.index_value);
        self.us_index_value = reading.us_index_value;
        self.us_aqi_flag = standard.is_us();
        self.levels = PollutantLevels::from_reading(reading);
        self.source_label = Some(format!("Source: {}", reading.provider_label()));
        self.total_pinned_count = total;
        self.status = WidgetStatus::Success;
    }

    fn touch(&mut self) {
        self.updated_at = Some(OffsetDateTime::now_utc().unix_timestamp());
    }
}

/// Receives force-refresh requests from the sync engine.
pub trait WidgetNotifier: Send + Sync {
    fn request_force_refresh(&self);
}

/// Notifier for engines without a widget.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl WidgetNotifier for NoopNotifier {
    fn request_force_refresh(&self) {}
}

/// Widget state persisted in a key/value store.
#[derive(Clone)]
pub struct WidgetStateStore {
    kv: Arc<dyn KeyValueStore>,
}

impl WidgetStateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Registered instance ids, ascending.
    pub fn instances(&self) -> Result<Vec<WidgetId>> {
        let mut ids: Vec<WidgetId> = self
            .kv
            .keys(WIDGET_NAMESPACE)?
            .iter()
            .filter_map(|key| key.strip_prefix(STATE_KEY_PREFIX)?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Add an instance in `Loading` state; an existing instance is kept.
    pub fn register(&self, id: WidgetId) -> Result<WidgetState> {
        if let Some(state) = self.load(id)? {
            return Ok(state);
        }
        let state = WidgetState::default();
        self.save(id, &state)?;
        debug!("Registered widget {}", id);
        Ok(state)
    }

    /// Remove an instance, returning whether it existed.
    pub fn unregister(&self, id: WidgetId) -> Result<bool> {
        Ok(self.kv.remove(WIDGET_NAMESPACE, &state_key(id))?)
    }

    /// Read an instance's state.
    ///
    /// An unreadable blob is reported as a fresh `Loading` state, since a
    /// half-written or foreign value must not take the widget down.
    pub fn load(&self, id: WidgetId) -> Result<Option<WidgetState>> {
        match get_json::<WidgetState>(self.kv.as_ref(), WIDGET_NAMESPACE, &state_key(id)) {
            Ok(state) => Ok(state),
            Err(breathe_store::Error::Serialization(e)) => {
                warn!("Resetting unreadable state of widget {}: {}", id, e);
                Ok(Some(WidgetState::default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write an instance's full state in one store write.
    pub fn save(&self, id: WidgetId, state: &WidgetState) -> Result<()> {
        let mut state = state.clone();
        state.touch();
        put_json(self.kv.as_ref(), WIDGET_NAMESPACE, &state_key(id), &state)?;
        Ok(())
    }

    /// Set every instance to `Loading`, keeping its displayed fields.
    pub fn mark_all_loading(&self) -> Result<()> {
        for id in self.instances()? {
            // removed since the listing
            let Some(mut state) = self.load(id)? else {
                continue;
            };
            state.status = WidgetStatus::Loading;
            self.save(id, &state)?;
        }
        Ok(())
    }

    /// Raise the force-refresh flag.
    pub fn request_refresh(&self) -> Result<()> {
        self.kv.put(WIDGET_NAMESPACE, FORCE_REFRESH_KEY, "true")?;
        Ok(())
    }

    /// Clear the force-refresh flag, returning whether it was raised.
    pub fn take_force_refresh(&self) -> Result<bool> {
        Ok(self.kv.remove(WIDGET_NAMESPACE, FORCE_REFRESH_KEY)?)
    }
}

/// Store-backed [`WidgetNotifier`] used by the engine side.
#[derive(Clone)]
pub struct WidgetSignal {
    store: WidgetStateStore,
}

impl WidgetSignal {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: WidgetStateStore::new(kv),
        }
    }
}

impl WidgetNotifier for WidgetSignal {
    fn request_force_refresh(&self) {
        if let Err(e) = self.store.mark_all_loading() {
            warn!("Failed to mark widgets loading: {}", e);
        }
        if let Err(e) = self.store.request_refresh() {
            warn!("Failed to raise widget refresh flag: {}", e);
        }
    }
}

/// Renders pinned zones into widget state, one zone per tick.
pub struct WidgetSyncBridge {
    store: WidgetStateStore,
    prefs: Preferences,
    source: Arc<dyn AqiSource>,
}

impl WidgetSyncBridge {
    pub fn new(kv: Arc<dyn KeyValueStore>, source: Arc<dyn AqiSource>) -> Self {
        Self {
            store: WidgetStateStore::new(Arc::clone(&kv)),
            prefs: Preferences::new(kv),
            source,
        }
    }

    pub fn store(&self) -> &WidgetStateStore {
        &self.store
    }

    pub fn register(&self, id: WidgetId) -> Result<WidgetState> {
        self.store.register(id)
    }

    pub fn unregister(&self, id: WidgetId) -> Result<bool> {
        self.store.unregister(id)
    }

    pub fn instances(&self) -> Result<Vec<WidgetId>> {
        self.store.instances()
    }

    pub fn state(&self, id: WidgetId) -> Result<Option<WidgetState>> {
        self.store.load(id)
    }

    /// Refresh every registered instance.
    ///
    /// A failing instance is logged and the rest still refresh. Returns the
    /// number of instances that refreshed without a storage error.
    pub async fn on_tick(&self) -> Result<usize> {
        let ids = self.store.instances()?;
        let mut refreshed = 0;
        for id in ids {
            match self.tick_instance(id).await {
                Ok(state) => {
                    debug!("Widget {} is {}", id, state.status);
                    refreshed += 1;
                }
                Err(e) => warn!("Widget {} refresh failed: {}", id, e),
            }
        }
        Ok(refreshed)
    }

    /// Refresh one instance from the zone under its cursor.
    pub async fn tick_instance(&self, id: WidgetId) -> Result<WidgetState> {
        let pins = self.prefs.pins()?;
        let standard = self.prefs.standard()?;
        let mut state = self.store.load(id)?.unwrap_or_default();

        if pins.is_empty() {
            state.status = WidgetStatus::Empty;
            state.total_pinned_count = 0;
            self.save_if_registered(id, &state)?;
            return Ok(state);
        }

        if state.cursor >= pins.len() {
            state.cursor = 0;
        }
        let Some(zone_id) = pins.nth(state.cursor % pins.len()) else {
            return Ok(state);
        };

        match self.source.zone_aqi(zone_id).await {
            Ok(reading) => state.apply_reading(&reading, standard, pins.len()),
            Err(e) => {
                warn!("Widget {} failed to fetch zone {}: {}", id, zone_id, e);
                state.status = WidgetStatus::Error;
            }
        }

        self.save_if_registered(id, &state)?;
        Ok(state)
    }

    /// Show the next pinned zone.
    pub async fn next(&self, id: WidgetId) -> Result<WidgetState> {
        self.cycle(id, 1).await
    }

    /// Show the previous pinned zone.
    pub async fn previous(&self, id: WidgetId) -> Result<WidgetState> {
        self.cycle(id, -1).await
    }

    async fn cycle(&self, id: WidgetId, direction: isize) -> Result<WidgetState> {
        let Some(mut state) = self.store.load(id)? else {
            debug!("Ignoring navigation for unregistered widget {}", id);
            return Ok(WidgetState::default());
        };
        let pins = self.prefs.pins()?;
        if pins.len() <= 1 {
            return Ok(state);
        }

        state.cursor = wrap_cursor(state.cursor, direction, pins.len());
        state.status = WidgetStatus::Loading;
        self.save_if_registered(id, &state)?;
        self.tick_instance(id).await
    }

    /// Mark all instances `Loading` and refresh them.
    pub async fn on_pins_changed(&self) -> Result<usize> {
        self.store.mark_all_loading()?;
        self.on_tick().await
    }

    fn save_if_registered(&self, id: WidgetId, state: &WidgetState) -> Result<()> {
        if self.store.load(id)?.is_some() {
            self.store.save(id, state)
        } else {
            debug!("Widget {} was removed during refresh", id);
            Ok(())
        }
    }
}

/// Step `cursor` by `direction`, wrapping within `len`.
fn wrap_cursor(cursor: usize, direction: isize, len: usize) -> usize {
    let next = cursor.min(len - 1) as isize + direction;
    if next < 0 {
        len - 1
    } else if next as usize >= len {
        0
    } else {
        next as usize
    }
}

/// Scheduling for [`WidgetHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetHostConfig {
    /// Period of the regular widget refresh.
    pub refresh_interval: Duration,
    /// How often the force-refresh flag is checked.
    pub signal_poll_interval: Duration,
}

impl Default for WidgetHostConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30 * 60),
            signal_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Drives a [`WidgetSyncBridge`] the way a home-screen host would.
pub struct WidgetHost {
    bridge: Arc<WidgetSyncBridge>,
    config: WidgetHostConfig,
}

impl WidgetHost {
    pub fn new(bridge: Arc<WidgetSyncBridge>, config: WidgetHostConfig) -> Self {
        Self { bridge, config }
    }

    /// Run until `cancel` fires.
    ///
    /// Instances refresh immediately, then on every regular tick, whenever
    /// the force-refresh flag is found raised, and on
    /// [`SyncEvent::WidgetRefreshRequested`] from an in-process engine.
    pub async fn run(self, mut events: Option<EventReceiver>, cancel: CancellationToken) {
        let mut refresh = interval(self.config.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut poll = interval(self.config.signal_poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Widget host started (refresh every {:?})",
            self.config.refresh_interval
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Widget host stopped");
                    break;
                }
                _ = refresh.tick() => {
                    self.tick("scheduled").await;
                }
                _ = poll.tick() => {
                    match self.bridge.store().take_force_refresh() {
                        Ok(true) => self.tick("forced").await,
                        Ok(false) => {}
                        Err(e) => warn!("Failed to read widget refresh flag: {}", e),
                    }
                }
                event = recv_event(&mut events), if events.is_some() => {
                    match event {
                        Ok(SyncEvent::WidgetRefreshRequested) => {
                            // the flag raised with this event is served here
                            if let Err(e) = self.bridge.store().take_force_refresh() {
                                warn!("Failed to clear widget refresh flag: {}", e);
                            }
                            self.tick("requested").await;
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(n)) => {
                            debug!("Widget host skipped {} events", n);
                        }
                        Err(RecvError::Closed) => events = None,
                    }
                }
            }
        }
    }

    async fn tick(&self, reason: &str) {
        match self.bridge.on_tick().await {
            Ok(n) => debug!("Widget tick ({}) refreshed {} instances", reason, n),
            Err(e) => warn!("Widget tick ({}) failed: {}", reason, e),
        }
    }
}

async fn recv_event(events: &mut Option<EventReceiver>) -> std::result::Result<SyncEvent, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
