//! Trait abstractions over the remote air-quality service.
//!
//! [`AqiSource`] abstracts over the real HTTP client and [`crate::MockSource`]
//! so the sync engine and the widget bridge can be driven in tests.

use std::sync::Arc;

use async_trait::async_trait;

use breathe_types::{Reading, Zone};

use crate::error::Result;

/// The two read-only operations the sync core consumes.
///
/// # Example
///
/// ```ignore
/// use breathe_core::{AqiSource, Result};
///
/// async fn print_zones<S: AqiSource>(source: &S) -> Result<()> {
///     for zone in source.list_zones().await? {
///         println!("{} ({})", zone.display_name, zone.id);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait AqiSource: Send + Sync {
    /// Fetch the full zone catalog.
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// Fetch the current reading of one zone.
    async fn zone_aqi(&self, zone_id: &str) -> Result<Reading>;
}

#[async_trait]
impl<S: AqiSource + ?Sized> AqiSource for Arc<S> {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        (**self).list_zones().await
    }

    async fn zone_aqi(&self, zone_id: &str) -> Result<Reading> {
        (**self).zone_aqi(zone_id).await
    }
}
