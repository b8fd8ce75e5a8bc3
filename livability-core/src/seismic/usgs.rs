use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http;

use super::{MIN_COUNTED_MAGNITUDE, QuakeEvent, SeismicFeed};

const QUERY_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// USGS FDSN event service, GeoJSON output.
#[derive(Debug, Clone)]
pub struct UsgsFeed {
    http: Client,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Default, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    mag: Option<f64>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    place: Option<String>,
}

impl From<Feature> for QuakeEvent {
    fn from(feature: Feature) -> Self {
        let Properties { mag, time, place } = feature.properties;
        QuakeEvent { magnitude: mag, time_ms: time, place }
    }
}

/// `[end - period_years, end]`, as query dates.
fn window(end: NaiveDate, period_years: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = end
        .checked_sub_months(Months::new(period_years.saturating_mul(12)))
        .ok_or_else(|| anyhow!("seismic period of {period_years} years is out of range"))?;
    Ok((start, end))
}

impl UsgsFeed {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self { http: http::client_with_timeout(timeout, None)? })
    }
}

#[async_trait]
impl SeismicFeed for UsgsFeed {
    async fn events(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        period_years: u32,
    ) -> Result<Vec<QuakeEvent>> {
        let (start, end) = window(Utc::now().date_naive(), period_years)?;
        debug!(lat, lon, radius_km, %start, %end, "querying USGS event feed");

        let params = [
            ("format", "geojson".to_string()),
            ("starttime", start.format("%Y-%m-%d").to_string()),
            ("endtime", end.format("%Y-%m-%d").to_string()),
            ("latitude", format!("{lat:.6}")),
            ("longitude", format!("{lon:.6}")),
            ("maxradiuskm", radius_km.to_string()),
            ("minmagnitude", MIN_COUNTED_MAGNITUDE.to_string()),
            ("orderby", "time".to_string()),
        ];

        let res = self
            .http
            .get(QUERY_URL)
            .query(&params)
            .send()
            .await
            .context("Failed to send request to USGS")?;

        let parsed: FeatureCollection = http::decode_json(res, "USGS").await?;
        Ok(parsed.features.into_iter().map(QuakeEvent::from).collect())
    }
}
