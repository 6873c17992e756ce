//! Core types for air-quality zones and readings.
//!
//! The serde field names follow the remote service's JSON so a [`Reading`]
//! can be decoded straight from `GET /aqi/zone/{id}` and written back to the
//! cache unchanged.

use core::fmt;
use std::collections::BTreeMap;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// A monitored geographic location.
///
/// Identity is `id`; zones are immutable once fetched and are replaced
/// wholesale on every successful catalog fetch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Zone {
    /// Stable, unique identifier.
    pub id: String,
    /// Human-readable zone name.
    #[cfg_attr(feature = "serde", serde(rename = "name"))]
    pub display_name: String,
    /// Data provider, if the service reports one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub provider: Option<String>,
    /// Latitude in decimal degrees.
    #[cfg_attr(feature = "serde", serde(default, rename = "lat"))]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[cfg_attr(feature = "serde", serde(default, rename = "lon"))]
    pub longitude: Option<f64>,
}

impl Zone {
    /// Create a zone with only an id and display name.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Set the zone coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the provider name.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Both coordinates, when the zone has a map position.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Case-insensitive substring match against the name and id.
    ///
    /// An empty (or whitespace-only) query matches every zone.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.display_name.to_lowercase().contains(&query) || self.id.to_lowercase().contains(&query)
    }
}

/// One point of a reading's short (about 24h) history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryPoint {
    /// Unix timestamp in seconds.
    #[cfg_attr(feature = "serde", serde(rename = "ts"))]
    pub timestamp_unix: i64,
    /// Index under the national standard.
    #[cfg_attr(feature = "serde", serde(rename = "aqi"))]
    pub index_value: i32,
    /// Index under the US standard, if the service computed one.
    #[cfg_attr(feature = "serde", serde(default, rename = "us_aqi"))]
    pub us_index_value: Option<i32>,
}

/// Short-term change of the national index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trend {
    /// Change over the last hour.
    #[cfg_attr(feature = "serde", serde(default, rename = "change_1h"))]
    pub change_last_hour: Option<i32>,
    /// Change over the last 24 hours.
    #[cfg_attr(feature = "serde", serde(default, rename = "change_24h"))]
    pub change_last_24h: Option<i32>,
}

/// One zone's most recent air-quality measurement.
///
/// Optional collections (`breakdown`, `concentrations`, `history`) keep the
/// difference between "field absent" (`None`) and "present but empty"
/// (`Some` of an empty collection).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Zone this reading belongs to.
    pub zone_id: String,
    /// Zone name as reported alongside the reading.
    pub zone_name: String,
    /// Index under the national standard.
    #[cfg_attr(feature = "serde", serde(rename = "aqi"))]
    pub index_value: i32,
    /// Index under the US standard, if the service computed one.
    #[cfg_attr(feature = "serde", serde(default, rename = "us_aqi"))]
    pub us_index_value: Option<i32>,
    /// Dominant pollutant key (e.g. `"pm2_5"`).
    pub main_pollutant: String,
    /// Per-pollutant sub-indices.
    #[cfg_attr(feature = "serde", serde(default, rename = "aqi_breakdown"))]
    pub breakdown: Option<BTreeMap<String, i32>>,
    /// Pollutant concentrations in US units, keyed by pollutant key.
    #[cfg_attr(feature = "serde", serde(default, rename = "concentrations_us_units"))]
    pub concentrations: Option<BTreeMap<String, f64>>,
    /// Observation time as a Unix timestamp.
    #[cfg_attr(feature = "serde", serde(default, rename = "timestamp_unix"))]
    pub observed_at_unix: Option<f64>,
    /// Free-form last update string from the service.
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_update: Option<String>,
    /// Chronological history window.
    #[cfg_attr(feature = "serde", serde(default))]
    pub history: Option<Vec<HistoryPoint>>,
    /// Short-term trend.
    #[cfg_attr(feature = "serde", serde(default, rename = "trends"))]
    pub trend: Option<Trend>,
    /// Advisory text attached by the service.
    #[cfg_attr(feature = "serde", serde(default))]
    pub warning: Option<String>,
    /// Upstream data source.
    #[cfg_attr(feature = "serde", serde(default, rename = "source"))]
    pub source_label: Option<String>,
}

impl Reading {
    /// Create a minimal reading with only the required fields.
    pub fn new(zone_id: impl Into<String>, index_value: i32) -> Self {
        let zone_id = zone_id.into();
        Self {
            zone_name: zone_id.clone(),
            zone_id,
            index_value,
            us_index_value: None,
            main_pollutant: Pollutant::Pm25.key().to_string(),
            breakdown: None,
            concentrations: None,
            observed_at_unix: None,
            last_update: None,
            history: None,
            trend: None,
            warning: None,
            source_label: None,
        }
    }

    /// Concentration of a tracked pollutant, if reported.
    ///
    /// PM2.5 also accepts the dotted `"pm2.5"` key some providers emit.
    pub fn concentration(&self, pollutant: Pollutant) -> Option<f64> {
        let concentrations = self.concentrations.as_ref()?;
        concentrations.get(pollutant.key()).copied().or_else(|| {
            if pollutant == Pollutant::Pm25 {
                concentrations.get("pm2.5").copied()
            } else {
                None
            }
        })
    }

    /// PM2.5 concentration in µg/m³, if reported.
    pub fn pm25(&self) -> Option<f64> {
        self.concentration(Pollutant::Pm25)
    }

    /// History points, empty when the service sent none.
    pub fn history_points(&self) -> &[HistoryPoint] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Observation time, if the timestamp is present and representable.
    pub fn observed_at(&self) -> Option<OffsetDateTime> {
        let ts = self.observed_at_unix?;
        if !ts.is_finite() {
            return None;
        }
        OffsetDateTime::from_unix_timestamp(ts.trunc() as i64).ok()
    }

    /// Short provider name derived from the source label.
    pub fn provider_label(&self) -> &'static str {
        match &self.source_label {
            Some(source) if source.to_lowercase().contains("airgradient") => "AirGradient",
            _ => "OpenMeteo",
        }
    }
}

/// The six pollutants the service reports concentrations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Pollutant {
    /// Fine particulate matter.
    #[cfg_attr(feature = "serde", serde(rename = "pm2_5"))]
    Pm25,
    /// Coarse particulate matter.
    Pm10,
    /// Nitrogen dioxide.
    No2,
    /// Sulphur dioxide.
    So2,
    /// Carbon monoxide.
    Co,
    /// Ozone.
    O3,
}

impl Pollutant {
    /// All tracked pollutants in display order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    /// Key used in the service's concentration map.
    pub fn key(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm2_5",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
            Pollutant::O3 => "o3",
        }
    }

    /// Chemical display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO₂",
            Pollutant::So2 => "SO₂",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O₃",
        }
    }
}

impl FromStr for Pollutant {
    type Err = ParseError;

    /// Parse a pollutant key (case-insensitive, `"pm2.5"` accepted).
    ///
    /// ```
    /// use breathe_types::Pollutant;
    ///
    /// assert_eq!("PM2.5".parse::<Pollutant>(), Ok(Pollutant::Pm25));
    /// assert_eq!("no2".parse::<Pollutant>(), Ok(Pollutant::No2));
    /// assert!("radon".parse::<Pollutant>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pm2_5" | "pm2.5" | "pm25" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            "no2" => Ok(Pollutant::No2),
            "so2" => Ok(Pollutant::So2),
            "co" => Ok(Pollutant::Co),
            "o3" => Ok(Pollutant::O3),
            _ => Err(ParseError::UnknownPollutant(s.to_string())),
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Display name for any pollutant key; unknown keys are upper-cased.
pub fn format_pollutant_name(key: &str) -> String {
    match key.parse::<Pollutant>() {
        Ok(pollutant) => pollutant.display_name().to_string(),
        Err(_) => key.to_uppercase(),
    }
}

/// The two competing AQI standards.
///
/// # Display vs Serialization
///
/// `Display` returns the short label ("NAQI", "US AQI"), while serde uses the
/// lowercase variant names ("national", "us").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AqiStandard {
    /// National index (NAQI).
    #[default]
    National,
    /// US EPA index.
    Us,
}

impl AqiStandard {
    /// Map the persisted `is_us_aqi` flag to a standard.
    pub fn from_us_flag(is_us: bool) -> Self {
        if is_us { AqiStandard::Us } else { AqiStandard::National }
    }

    /// Whether this is the US standard.
    pub fn is_us(&self) -> bool {
        matches!(self, AqiStandard::Us)
    }

    /// Short label shown next to an index value.
    pub fn label(&self) -> &'static str {
        match self {
            AqiStandard::National => "NAQI",
            AqiStandard::Us => "US AQI",
        }
    }

    /// Long description of the standard.
    pub fn description(&self) -> &'static str {
        match self {
            AqiStandard::National => "Indian National Air Quality Index (NAQI)",
            AqiStandard::Us => "US EPA (2024 Standard)",
        }
    }
}

impl FromStr for AqiStandard {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "national" | "naqi" | "in" => Ok(AqiStandard::National),
            "us" | "usa" | "epa" => Ok(AqiStandard::Us),
            _ => Err(ParseError::UnknownStandard(s.to_string())),
        }
    }
}

impl fmt::Display for AqiStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
