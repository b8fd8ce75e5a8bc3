//! Country resolution for a weather payload.

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::provider::WeatherPayload;

pub mod nominatim;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    /// Country name at a coordinate, `None` when the service knows none.
    async fn country_at(&self, lat: f64, lon: f64) -> anyhow::Result<Option<String>>;
}

/// Last comma-separated segment of `"City, Region, Country"`.
pub fn country_from_resolved_address(address: &str) -> Option<String> {
    address
        .rsplit(',')
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Best-effort: prefer the resolved address, then reverse-geocode the coordinates.
///
/// Any failure resolves to `None`; it never fails the caller.
pub async fn resolve_country(
    payload: &WeatherPayload,
    geocoder: &dyn ReverseGeocoder,
) -> Option<String> {
    if let Some(address) = payload.resolved_address.as_deref().filter(|a| !a.is_empty()) {
        return country_from_resolved_address(address);
    }

    let (lat, lon) = payload.coordinates()?;
    match geocoder.country_at(lat, lon).await {
        Ok(country) => {
            debug!(lat, lon, country = ?country, "reverse geocoded country");
            country
        }
        Err(err) => {
            warn!(lat, lon, error = %format!("{err:#}"), "reverse geocoding failed");
            None
        }
    }
}
