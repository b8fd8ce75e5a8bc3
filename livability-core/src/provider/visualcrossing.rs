use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::{http, model::LocationQuery};

use super::{WeatherPayload, WeatherProvider};

const BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline/";

#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    api_key: String,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self { api_key, http: http::client_with_timeout(timeout, None)? })
    }

    fn timeline_url(&self, query: &LocationQuery) -> Result<Url> {
        let mut url = Url::parse(BASE_URL).context("Invalid Visual Crossing base URL")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Visual Crossing base URL cannot carry a path"))?;
            segments.pop_if_empty().push(&query.city);
            if let Some(date) = query.date {
                segments.push(&date.format("%Y-%m-%d").to_string());
            }
        }

        let include = if query.date.is_some() { "days" } else { "current" };
        url.query_pairs_mut()
            .append_pair("unitGroup", "metric")
            .append_pair("include", include)
            .append_pair("key", &self.api_key)
            .append_pair("contentType", "json");

        Ok(url)
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherPayload> {
        let url = self.timeline_url(query)?;
        debug!(city = %query.city, date = ?query.date, "requesting Visual Crossing timeline");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send request to Visual Crossing")?;

        http::decode_json(res, "Visual Crossing").await
    }
}
