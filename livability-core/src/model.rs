use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{comfort::ComfortFormula, error::ReportError};

/// Accepted input date layouts, tried in order.
const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    pub date: Option<NaiveDate>,
}

impl LocationQuery {
    pub fn new(city: impl Into<String>, date: Option<NaiveDate>) -> Result<Self, ReportError> {
        let city = city.into().trim().to_string();
        if city.is_empty() {
            return Err(ReportError::InvalidInput("city is required".into()));
        }
        Ok(Self { city, date })
    }
}

/// Parse `DD-MM-YYYY` or `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ReportError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            ReportError::InvalidInput(format!("date '{raw}' must be DD-MM-YYYY or YYYY-MM-DD"))
        })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Zero when the provider gave no usable temperature.
    pub temperature: f64,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub conditions: String,
    pub hourly_breakdown: Vec<serde_json::Value>,
}

/// Country and city figures. Zero means "unknown", never a real zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomicProfile {
    pub gdp_usd: f64,
    pub population_total: u64,
    pub population_density: f64,
    pub city_population: u64,
    pub city_density: f64,
}

impl EconomicProfile {
    pub fn has_country_economy(&self) -> bool {
        self.gdp_usd > 0.0 && self.population_total > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeSummary {
    /// Milliseconds since the Unix epoch, as reported by the feed.
    pub time: Option<i64>,
    #[serde(rename = "mag")]
    pub magnitude: f64,
    pub place: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeismicProfile {
    pub risk_score: f64,
    pub event_count: usize,
    pub max_magnitude: f64,
    /// Newest first, at most ten.
    pub recent_events: Vec<QuakeSummary>,
}

/// The assembled response for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEnvironmentReport {
    pub city: String,
    /// `DD-MM-YYYY`.
    pub date: String,
    pub temperature: f64,
    pub conditions: String,
    pub air_purity: u8,
    pub road_traffic: u8,
    pub crime_risks: u8,
    pub life_comfort_index: f64,
    pub comfort_strategy: ComfortFormula,

    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub temp_max: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub temp_min: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub humidity: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub wind_speed: f64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub gdp_usd: f64,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub population_total: u64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub population_density: f64,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub city_population: u64,
    #[serde(default, rename = "city_density_per_km2", skip_serializing_if = "is_zero_f64")]
    pub city_density: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy_index: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earthquake_risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earthquake_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_earthquakes: Option<Vec<QuakeSummary>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_forecast: Option<String>,
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_city_is_rejected() {
        let err = LocationQuery::new("   ", None).unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[test]
    fn city_is_trimmed() {
        let query = LocationQuery::new("  Oslo ", None).unwrap();
        assert_eq!(query.city, "Oslo");
    }

    #[test]
    fn both_date_layouts_parse() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        assert_eq!(parse_date("14-07-2025").unwrap(), expected);
        assert_eq!(parse_date("2025-07-14").unwrap(), expected);
    }

    #[test]
    fn malformed_date_is_invalid_input() {
        let err = parse_date("07/14/2025").unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(ref msg) if msg.contains("DD-MM-YYYY")));
    }

    #[test]
    fn economy_requires_gdp_and_population() {
        let mut profile = EconomicProfile { gdp_usd: 1.0e12, ..Default::default() };
        assert!(!profile.has_country_economy());

        profile.population_total = 10_000_000;
        assert!(profile.has_country_economy());
    }
}
