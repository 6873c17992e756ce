//! Platform-agnostic types for air-quality zones and readings.
//!
//! This crate provides the shared data model used by the sync engine
//! (breathe-core), the local cache (breathe-store) and the CLI.
//!
//! # Features
//!
//! - Zone catalog and per-zone reading types
//! - History points and short-term trends
//! - Pollutant keys and display names
//! - The two AQI standards (national and US)
//! - Error types for value parsing
//!
//! # Example
//!
//! ```
//! use breathe_types::{AqiStandard, Pollutant, Zone};
//!
//! let zone = Zone::new("srinagar", "Srinagar");
//! assert!(zone.matches("SRI"));
//! assert_eq!(Pollutant::No2.display_name(), "NO₂");
//! assert_eq!(AqiStandard::Us.label(), "US AQI");
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    AqiStandard, HistoryPoint, Pollutant, Reading, Trend, Zone, format_pollutant_name,
};
