use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http;

use super::ReverseGeocoder;

const BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// OpenStreetMap Nominatim: reverse geocoding and free-text place search.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    #[serde(default)]
    country: Option<String>,
}

/// One search hit. Only the tags the stats lookup needs are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub extratags: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Place {
    fn tag(&self, key: &str) -> Option<&str> {
        self.extratags.as_ref()?.get(key)?.as_str()
    }

    /// `extratags.population`; zero when absent or unparseable.
    pub fn population(&self) -> u64 {
        self.tag("population").map(parse_count).unwrap_or(0)
    }

    /// `extratags.area` in km², rarely tagged; zero when absent.
    pub fn area_km2(&self) -> f64 {
        self.tag("area")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }
}

/// Leading integer of a free-text figure such as `"1,234,567"` or `"52000 (2021)"`.
fn parse_count(raw: &str) -> u64 {
    raw.split_whitespace()
        .next()
        .map(|token| token.replace([',', '_'], ""))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

impl NominatimClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http::client_with_timeout(timeout, Some(user_agent))?,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another Nominatim instance.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// First match for a free-text query, with extra tags.
    pub async fn search(&self, query: &str) -> Result<Option<Place>> {
        debug!(query, "searching Nominatim");
        let res = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("format", "json"),
                ("limit", "1"),
                ("q", query),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await
            .context("Failed to send request to Nominatim (search)")?;

        let places: Vec<Place> = http::decode_json(res, "Nominatim search").await?;
        Ok(places.into_iter().next())
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn country_at(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        debug!(lat, lon, "reverse geocoding with Nominatim");
        let (lat, lon) = (format!("{lat:.6}"), format!("{lon:.6}"));
        let res = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", "3"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .context("Failed to send request to Nominatim (reverse)")?;

        let parsed: ReverseResponse = http::decode_json(res, "Nominatim reverse").await?;
        Ok(parsed.address.and_then(|a| a.country).filter(|c| !c.trim().is_empty()))
    }
}
