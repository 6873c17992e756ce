//! HTTP client for the remote air-quality service.
//!
//! The service exposes two read-only JSON endpoints:
//!
//! - `GET /zones` returns `{ "zones": [...] }`
//! - `GET /aqi/zone/{zone_id}` returns one reading
//!
//! # Example
//!
//! ```no_run
//! use breathe_core::{AqiSource, BreatheClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BreatheClient::new("https://api.example.org")?;
//!
//! for zone in client.list_zones().await? {
//!     let reading = client.zone_aqi(&zone.id).await?;
//!     println!("{}: {}", zone.display_name, reading.index_value);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use breathe_types::{Reading, Zone};

use crate::error::{Error, Result};
use crate::traits::AqiSource;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the air-quality service.
#[derive(Debug, Clone)]
pub struct BreatheClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    zones: Vec<Zone>,
}

impl BreatheClient {
    /// Create a new client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The service root (e.g., "https://api.example.org")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Request)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Service URL for `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::NotReachable {
                url: url.to_string(),
                source: e,
            })?;

        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(Error::Request)
        } else {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .or_else(|| v.get("detail"))
                        .and_then(|e| e.as_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| status.to_string());

            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl AqiSource for BreatheClient {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = self.endpoint(&["zones"])?;
        let response: ZonesResponse = self.get(url).await?;
        Ok(response.zones)
    }

    async fn zone_aqi(&self, zone_id: &str) -> Result<Reading> {
        // dot segments are dropped by the URL builder
        if matches!(zone_id, "" | "." | "..") {
            return Err(Error::InvalidData(format!("Invalid zone id: {zone_id:?}")));
        }
        let url = self.endpoint(&["aqi", "zone", zone_id])?;
        self.get(url).await
    }
}

/// Trim trailing slashes and require an http(s) scheme.
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BreatheClient::new("http://localhost:8000");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = BreatheClient::new("https://api.example.org//").unwrap();
        assert_eq!(client.base_url(), "https://api.example.org");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = BreatheClient::new("api.example.org");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_zone_id_rejects_empty_and_dot_segments() {
        let client = BreatheClient::new("http://localhost:1").unwrap();
        for id in ["", ".", ".."] {
            assert!(matches!(client.zone_aqi(id).await, Err(Error::InvalidData(_))));
        }
    }

    #[test]
    fn test_zone_id_is_percent_encoded() {
        let client = BreatheClient::new("http://localhost:8000").unwrap();
        let url = client.endpoint(&["aqi", "zone", "a b?c#d%"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/aqi/zone/a%20b%3Fc%23d%25");

        let url = client.endpoint(&["aqi", "zone", "../zones"]).unwrap();
        assert_eq!(url.path(), "/aqi/zone/..%2Fzones");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BreatheClient::new("https://api.example.org/v1/").unwrap();
        let url = client.endpoint(&["zones"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/v1/zones");
    }

    #[test]
    fn test_zones_response_shape() {
        let json = r#"{"zones":[{"id":"a","name":"Alpha"},{"id":"b","name":"Bravo","lat":1.0,"lon":2.0}]}"#;
        let response: ZonesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.zones.len(), 2);
        assert_eq!(response.zones[1].coordinates(), Some((1.0, 2.0)));
    }
}
