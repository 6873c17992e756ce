//! Error types for breathe-core.
//!
//! # Where errors surface
//!
//! | Error | Raised by | Surfaced to |
//! |-------|-----------|-------------|
//! | [`Error::NotReachable`], [`Error::Timeout`] | [`crate::AqiSource`] | foreground catalog refresh only |
//! | [`Error::Api`] | [`crate::BreatheClient`] | foreground catalog refresh only |
//! | [`Error::Request`] | response decoding | foreground catalog refresh only |
//! | [`Error::Store`] | pins, preferences, widget state | the caller of the mutating operation |
//! | [`Error::UnknownZone`] | [`crate::MockSource`], widget commands | the caller |
//!
//! Per-zone reading failures never reach the caller of
//! [`crate::SyncEngine::refresh`]; they are logged and the zone is left out of
//! that cycle.
//!
//! ## Error Classification
//!
//! [`Error::is_retryable`] decides what [`crate::with_retry`] retries:
//!
//! - [`Error::NotReachable`] - connection refused or DNS failure
//! - [`Error::Timeout`] - slow service
//! - [`Error::Api`] with a 5xx or 429 status
//! - [`Error::Request`] when reqwest reports a timeout or connect failure
//!
//! Everything else (bad data, unknown zones, configuration, storage) is final.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while syncing air-quality data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote service could not be reached.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request or response decoding failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid service URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Data could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Zone id is not known.
    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    /// Persistence failed.
    #[error("Storage error: {0}")]
    Store(#[from] breathe_store::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an unknown zone error.
    pub fn unknown_zone(zone_id: impl Into<String>) -> Self {
        Self::UnknownZone(zone_id.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether repeating the operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::NotReachable { .. } => true,
            Error::Timeout { .. } => true,
            Error::Api { status, .. } => *status >= 500 || *status == 429,
            Error::Request(e) => e.is_timeout() || e.is_connect(),
            Error::InvalidUrl(_) => false,
            Error::InvalidData(_) => false,
            Error::UnknownZone(_) => false,
            Error::Store(_) => false,
            Error::InvalidConfig(_) => false,
        }
    }
}

impl From<breathe_types::ParseError> for Error {
    fn from(err: breathe_types::ParseError) -> Self {
        Error::InvalidData(err.to_string())
    }
}

/// Result type alias using breathe-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_zone("srinagar");
        assert_eq!(err.to_string(), "Unknown zone: srinagar");

        let err = Error::api(503, "maintenance");
        assert_eq!(err.to_string(), "API error (503): maintenance");

        let err = Error::timeout("zone_aqi", Duration::from_secs(10));
        assert!(err.to_string().contains("zone_aqi"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::timeout("x", Duration::from_secs(1)).is_retryable());
        assert!(Error::api(500, "boom").is_retryable());
        assert!(Error::api(429, "slow down").is_retryable());
        assert!(!Error::api(404, "missing").is_retryable());
        assert!(!Error::InvalidData("bad".to_string()).is_retryable());
        assert!(!Error::unknown_zone("z").is_retryable());
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Error = "radon".parse::<breathe_types::Pollutant>().unwrap_err().into();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(err.to_string().contains("radon"));
    }

    #[test]
    fn test_store_error_conversion() {
        let err: Error = breathe_store::Error::LockPoisoned.into();
        assert!(matches!(err, Error::Store(_)));
        assert!(!err.is_retryable());
    }
}
