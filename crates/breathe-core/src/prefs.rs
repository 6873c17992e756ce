//! Pinned zones and user preferences.
//!
//! Both live in the shared key/value store under [`PREFS_NAMESPACE`], which
//! is how the widget host (a separate process) learns about pins and the
//! chosen AQI standard.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use breathe_store::{KeyValueStore, get_json, put_json};
use breathe_types::AqiStandard;

use crate::error::Result;

/// Namespace for pins and preferences.
pub const PREFS_NAMESPACE: &str = "breathe_prefs";
/// Key of the persisted pin set.
pub const PINNED_IDS_KEY: &str = "pinned_ids";
/// Key of the AQI standard flag.
pub const IS_US_AQI_KEY: &str = "is_us_aqi";

/// The user's pinned zone ids.
///
/// Membership is independent of whether a reading exists for the zone.
/// Iteration is in sorted id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinSet(BTreeSet<String>);

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, zone_id: &str) -> bool {
        self.0.contains(zone_id)
    }

    /// Flip membership of `zone_id`, returning whether it is now pinned.
    pub fn toggle(&mut self, zone_id: &str) -> bool {
        if self.0.remove(zone_id) {
            false
        } else {
            self.0.insert(zone_id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pinned ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The id at `index` in sorted order.
    pub fn nth(&self, index: usize) -> Option<&str> {
        self.iter().nth(index)
    }

    /// Read the persisted pin set; a missing entry is an empty set.
    pub fn load(kv: &dyn KeyValueStore) -> Result<Self> {
        Ok(get_json(kv, PREFS_NAMESPACE, PINNED_IDS_KEY)?.unwrap_or_default())
    }

    /// Like [`PinSet::load`], treating unreadable data as no pins.
    pub fn load_or_default(kv: &dyn KeyValueStore) -> Self {
        Self::load(kv).unwrap_or_else(|e| {
            warn!("Ignoring unreadable pin set: {}", e);
            Self::default()
        })
    }

    /// Persist the pin set.
    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<()> {
        put_json(kv, PREFS_NAMESPACE, PINNED_IDS_KEY, self)?;
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for PinSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Persisted user preferences.
#[derive(Clone)]
pub struct Preferences {
    kv: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The chosen AQI standard; national unless the US flag is set.
    pub fn standard(&self) -> Result<AqiStandard> {
        let is_us: Option<bool> = get_json(self.kv.as_ref(), PREFS_NAMESPACE, IS_US_AQI_KEY)?;
        Ok(AqiStandard::from_us_flag(is_us.unwrap_or(false)))
    }

    /// Persist the chosen AQI standard.
    pub fn set_standard(&self, standard: AqiStandard) -> Result<()> {
        put_json(
            self.kv.as_ref(),
            PREFS_NAMESPACE,
            IS_US_AQI_KEY,
            &standard.is_us(),
        )?;
        Ok(())
    }

    /// The persisted pins.
    pub fn pins(&self) -> Result<PinSet> {
        PinSet::load(self.kv.as_ref())
    }
}
