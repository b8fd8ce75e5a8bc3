use crate::{Config, model::LocationQuery, provider::visualcrossing::VisualCrossingProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::{convert::TryFrom, fmt::Debug};

pub mod visualcrossing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    VisualCrossing,
    Gemini,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::VisualCrossing => "visualcrossing",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::VisualCrossing => "VISUAL_CROSSING_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::VisualCrossing, ProviderId::Gemini]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "visualcrossing" => Ok(ProviderId::VisualCrossing),
            "gemini" => Ok(ProviderId::Gemini),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: visualcrossing, gemini."
            )),
        }
    }
}

/// Raw weather payload as returned by the provider.
///
/// Every field is optional; the aggregator decides how to default each one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    #[serde(default)]
    pub resolved_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub days: Vec<ObservationFields>,
    #[serde(default)]
    pub current_conditions: Option<ObservationFields>,
}

impl WeatherPayload {
    pub fn first_day(&self) -> Option<&ObservationFields> {
        self.days.first()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Fields shared by a day entry and the current-conditions block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationFields {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub tempmax: Option<f64>,
    #[serde(default)]
    pub tempmin: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub hours: Option<Vec<serde_json::Value>>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the single-day payload when `query.date` is set, current conditions otherwise.
    async fn fetch(&self, query: &LocationQuery) -> anyhow::Result<WeatherPayload>;
}

/// Construct the weather provider from config.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = ProviderId::VisualCrossing;
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `livability configure {id}` or set {}.",
            id.env_var()
        )
    })?;

    let provider = VisualCrossingProvider::new(api_key.to_owned(), config.timeouts.weather())?;
    Ok(Box::new(provider))
}
