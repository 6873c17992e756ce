//! Data synchronization and caching engine for breathe air-quality zones.
//!
//! This crate fetches zone and AQI data from the remote service, reconciles
//! it with the user's pinned zones, converts between the national and US
//! AQI standards, keeps an offline snapshot for cold starts, and mirrors the
//! pinned state into a home-screen widget that runs in its own process.
//!
//! # Features
//!
//! - **Sync engine**: concurrent per-zone fetches, pinned zones first, with
//!   partial-failure tolerance ([`SyncEngine`])
//! - **Published snapshots**: every merge is broadcast on a watch channel
//!   ([`SyncSnapshot`])
//! - **Offline cache**: last good zones/readings in the shared store
//! - **AQI conversion**: PM2.5 to US AQI, bands, colors ([`aqi`])
//! - **Widget bridge**: per-instance widget state with cursor navigation
//!   ([`WidgetSyncBridge`], [`WidgetHost`])
//! - **Retry and events**: configurable backoff and a broadcast event stream
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use breathe_core::{BreatheClient, SyncEngine, WidgetSignal};
//! use breathe_store::Store;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Store::open_default()?);
//!     let client = Arc::new(BreatheClient::new("https://api.example.org")?);
//!     let engine = SyncEngine::new(client, store.clone())
//!         .with_notifier(Arc::new(WidgetSignal::new(store)));
//!
//!     engine.load_from_cache();
//!     engine.refresh(false).await?;
//!
//!     for reading in engine.snapshot().pinned_readings() {
//!         println!("{}: {}", reading.zone_name, reading.index_value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aqi;
pub mod client;
pub mod error;
pub mod events;
pub mod mock;
pub mod prefs;
pub mod retry;
pub mod snapshot;
pub mod sync;
pub mod traits;
pub mod util;
pub mod widget;

pub use breathe_types::{AqiStandard, HistoryPoint, Pollutant, Reading, Trend, Zone};

pub use aqi::{AqiBand, AqiColor};
pub use client::BreatheClient;
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, SyncEvent};
pub use mock::{MockSource, MockSourceBuilder};
pub use prefs::{PinSet, Preferences};
pub use retry::{RetryConfig, with_retry, with_timeout};
pub use snapshot::SyncSnapshot;
pub use sync::{FetchScope, RefreshReport, SyncConfig, SyncEngine};
pub use traits::AqiSource;
pub use widget::{
    NoopNotifier, PollutantLevels, WidgetHost, WidgetHostConfig, WidgetId, WidgetNotifier,
    WidgetSignal, WidgetState, WidgetStateStore, WidgetStatus, WidgetSyncBridge,
};
