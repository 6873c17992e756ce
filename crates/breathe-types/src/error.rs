//! Error types for data parsing in breathe-types.

use thiserror::Error;

/// Errors that can occur when parsing air-quality values.
///
/// This error type is transport-agnostic and does not include
/// network or storage errors (those belong in breathe-core and breathe-store).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Pollutant key is not one of the six tracked pollutants.
    #[error("Unknown pollutant: {0}")]
    UnknownPollutant(String),

    /// AQI standard name was not recognized.
    #[error("Unknown AQI standard: {0} (expected 'national' or 'us')")]
    UnknownStandard(String),

    /// A value was present but could not be interpreted.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using breathe-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
