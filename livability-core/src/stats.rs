//! Country and city statistics from public registries.
//!
//! Country figures come from REST Countries (population, area, ISO code) and
//! the World Bank GDP indicator. City population comes from a Nominatim
//! place search. Every lookup is best-effort.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{error::LookupError, geo::nominatim::NominatimClient, http};

const REST_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/name";
const WORLD_BANK_URL: &str = "https://api.worldbank.org/v2/country";
const GDP_INDICATOR: &str = "NY.GDP.MKTP.CD";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CountryStats {
    /// Zero when the indicator service had no value.
    pub gdp_usd: f64,
    pub population: u64,
    /// People per km², zero unless both population and area are known.
    pub density: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CityStats {
    pub population: u64,
    pub area_km2: f64,
}

impl CityStats {
    pub fn density(&self) -> f64 {
        density(self.population, self.area_km2)
    }
}

fn density(population: u64, area_km2: f64) -> f64 {
    if population > 0 && area_km2 > 0.0 { population as f64 / area_km2 } else { 0.0 }
}

#[async_trait]
pub trait StatsSource: Send + Sync + Debug {
    async fn country_stats(&self, country: &str) -> Result<CountryStats, LookupError>;

    async fn city_stats(&self, city: &str, country: &str) -> Result<CityStats, LookupError>;
}

#[derive(Debug, Default, Deserialize)]
struct RestCountry {
    #[serde(default)]
    population: Option<f64>,
    #[serde(default)]
    area: Option<f64>,
    #[serde(default)]
    cca3: Option<String>,
}

/// First non-null `value` in the series at index 1 of a World Bank response.
fn first_indicator_value(body: &serde_json::Value) -> Option<f64> {
    body.get(1)?
        .as_array()?
        .iter()
        .find_map(|point| point.get("value")?.as_f64())
}

#[derive(Debug, Clone)]
pub struct OpenDataStats {
    http: Client,
    places: NominatimClient,
    countries_url: Url,
    indicators_url: Url,
}

/// `base` with each segment appended, percent-encoded.
fn with_segments(base: &Url, segments: &[&str]) -> anyhow::Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{base} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl OpenDataStats {
    pub fn new(places: NominatimClient, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: http::client_with_timeout(timeout, None)?,
            places,
            countries_url: Url::parse(REST_COUNTRIES_URL)?,
            indicators_url: Url::parse(WORLD_BANK_URL)?,
        })
    }

    /// Use other country registry and indicator endpoints.
    pub fn with_endpoints(mut self, countries_url: &str, indicators_url: &str) -> anyhow::Result<Self> {
        self.countries_url = Url::parse(countries_url)
            .with_context(|| format!("Invalid country registry URL: {countries_url}"))?;
        self.indicators_url = Url::parse(indicators_url)
            .with_context(|| format!("Invalid indicator service URL: {indicators_url}"))?;
        Ok(self)
    }

    async fn lookup_country(&self, country: &str) -> anyhow::Result<Option<RestCountry>> {
        let res = self
            .http
            .get(with_segments(&self.countries_url, &[country])?)
            .send()
            .await
            .context("Failed to send request to REST Countries")?;

        let entries: Vec<RestCountry> = http::decode_json(res, "REST Countries").await?;
        Ok(entries.into_iter().next())
    }

    async fn lookup_gdp(&self, code: &str) -> anyhow::Result<Option<f64>> {
        let code = code.to_lowercase();
        let url = with_segments(&self.indicators_url, &[code.as_str(), "indicator", GDP_INDICATOR])?;
        let res = self
            .http
            .get(url)
            .query(&[("format", "json"), ("per_page", "1000")])
            .send()
            .await
            .context("Failed to send request to World Bank")?;

        let body: serde_json::Value = http::decode_json(res, "World Bank").await?;
        Ok(first_indicator_value(&body))
    }
}

#[async_trait]
impl StatsSource for OpenDataStats {
    async fn country_stats(&self, country: &str) -> Result<CountryStats, LookupError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(LookupError::NotFound("an empty country name".into()));
        }

        debug!(country, "looking up country registry");
        let entry = self
            .lookup_country(country)
            .await?
            .ok_or_else(|| LookupError::NotFound(format!("country '{country}'")))?;

        let population = entry.population.filter(|p| *p > 0.0).map(|p| p as u64).unwrap_or(0);
        let area = entry.area.unwrap_or(0.0);

        // A missing GDP leaves the partial result valid.
        let gdp_usd = match entry.cca3.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => match self.lookup_gdp(code).await {
                Ok(value) => value.unwrap_or(0.0),
                Err(err) => {
                    debug!(country, code, error = %format!("{err:#}"), "GDP lookup failed");
                    0.0
                }
            },
            None => 0.0,
        };

        Ok(CountryStats { gdp_usd, population, density: density(population, area) })
    }

    async fn city_stats(&self, city: &str, country: &str) -> Result<CityStats, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::NotFound("an empty city name".into()));
        }

        let place = self
            .places
            .search(&format!("{city}, {country}"))
            .await?
            .ok_or_else(|| LookupError::NotFound(format!("place '{city}, {country}'")))?;

        Ok(CityStats { population: place.population(), area_km2: place.area_km2() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Path prefix, status and body served by [`serve`].
    type Route = (&'static str, u16, String);

    /// Minimal HTTP/1.1 server answering each request from `routes`.
    ///
    /// Returns the base URL and the request paths it has seen.
    async fn serve(routes: Vec<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let path = target.split('?').next().unwrap_or("/").to_string();
                log.lock().unwrap().push(target);

                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| path.starts_with(prefix))
                    .map(|(_, status, body)| (*status, body.clone()))
                    .unwrap_or((404, r#"{"status":404}"#.to_string()));

                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, seen)
    }

    fn stats_for(base: &str) -> OpenDataStats {
        let timeout = Duration::from_secs(5);
        let places = NominatimClient::new("livability-tests", timeout)
            .unwrap()
            .with_base_url(&format!("{base}/nominatim"));
        OpenDataStats::new(places, timeout)
            .unwrap()
            .with_endpoints(&format!("{base}/countries"), &format!("{base}/wb"))
            .unwrap()
    }

    fn iceland() -> String {
        json!([{"name": {"common": "Iceland"}, "population": 366_000, "area": 103_000.0, "cca3": "ISL"}])
            .to_string()
    }

    #[test]
    fn rest_countries_entry_decodes_partially() {
        let entries: Vec<RestCountry> = serde_json::from_str(
            r#"[{"name": {"common": "Iceland"}, "population": 366425, "area": 103000.0, "cca3": "ISL"},
                {"name": {"common": "Other"}}]"#,
        )
        .unwrap();

        assert_eq!(entries[0].population, Some(366_425.0));
        assert_eq!(entries[0].cca3.as_deref(), Some("ISL"));
        assert_eq!(entries[1].area, None);
    }

    #[test]
    fn first_non_null_indicator_value_wins() {
        let body = json!([
            {"page": 1, "pages": 1},
            [
                {"date": "2024", "value": null},
                {"date": "2023", "value": 31_020_000_000.0},
                {"date": "2022", "value": 28_000_000_000.0}
            ]
        ]);

        assert_eq!(first_indicator_value(&body), Some(31_020_000_000.0));
    }

    #[test]
    fn indicator_error_payloads_yield_nothing() {
        let error_body = json!([{"message": [{"id": "120", "value": "Invalid value"}]}]);
        assert_eq!(first_indicator_value(&error_body), None);

        let all_null = json!([{}, [{"value": null}]]);
        assert_eq!(first_indicator_value(&all_null), None);
    }

    #[test]
    fn density_guards_against_zero() {
        assert_eq!(density(1_000, 0.0), 0.0);
        assert_eq!(density(0, 10.0), 0.0);
        assert_eq!(density(1_000, 10.0), 100.0);
        assert_eq!(CityStats { population: 500, area_km2: 2.0 }.density(), 250.0);
    }

    #[tokio::test]
    async fn country_stats_combine_registry_and_gdp() {
        let (base, seen) = serve(vec![
            ("/countries/Iceland", 200, iceland()),
            (
                "/wb/isl/indicator/NY.GDP.MKTP.CD",
                200,
                json!([{"page": 1}, [{"value": null}, {"value": 31_020_000_000.0}]]).to_string(),
            ),
        ])
        .await;

        let stats = stats_for(&base).country_stats("Iceland").await.unwrap();

        assert_eq!(stats.gdp_usd, 31_020_000_000.0);
        assert_eq!(stats.population, 366_000);
        assert!((stats.density - 366_000.0 / 103_000.0).abs() < 1e-9);
        assert!(seen.lock().unwrap()[1].contains("format=json"));
    }

    #[tokio::test]
    async fn failed_gdp_lookup_keeps_partial_result() {
        let (base, _) = serve(vec![
            ("/countries/Iceland", 200, iceland()),
            ("/wb/", 500, "upstream exploded".to_string()),
        ])
        .await;

        let stats = stats_for(&base).country_stats("Iceland").await.unwrap();

        assert_eq!(stats.gdp_usd, 0.0);
        assert_eq!(stats.population, 366_000);
        assert!(stats.density > 0.0);
    }

    #[tokio::test]
    async fn empty_gdp_series_keeps_partial_result() {
        let (base, _) = serve(vec![
            ("/countries/Iceland", 200, iceland()),
            ("/wb/", 200, json!([{"page": 1}, null]).to_string()),
        ])
        .await;

        let stats = stats_for(&base).country_stats("Iceland").await.unwrap();
        assert_eq!(stats.gdp_usd, 0.0);
        assert_eq!(stats.population, 366_000);
    }

    #[tokio::test]
    async fn empty_registry_answer_is_not_found() {
        let (base, _) = serve(vec![("/countries/", 200, "[]".to_string())]).await;

        let err = stats_for(&base).country_stats("Atlantis").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_error_status_is_upstream_failure() {
        let (base, _) = serve(vec![]).await;

        let err = stats_for(&base).country_stats("Atlantis").await.unwrap_err();
        assert!(matches!(err, LookupError::Upstream(_)));
    }

    #[tokio::test]
    async fn country_name_is_one_escaped_path_segment() {
        let (base, seen) = serve(vec![("/countries/", 200, "[]".to_string())]).await;

        let _ = stats_for(&base).country_stats("Bosnia/Herzegovina?x#y").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "/countries/Bosnia%2FHerzegovina%3Fx%23y");
    }

    #[tokio::test]
    async fn city_stats_read_place_tags() {
        let (base, seen) = serve(vec![(
            "/nominatim/search",
            200,
            json!([{"extratags": {"population": "131,136", "area": "273"}}]).to_string(),
        )])
        .await;

        let stats = stats_for(&base).city_stats("Reykjavik", "Iceland").await.unwrap();

        assert_eq!(stats.population, 131_136);
        assert_eq!(stats.area_km2, 273.0);
        assert!(seen.lock().unwrap()[0].contains("q=Reykjavik%2C+Iceland"));
    }

    #[tokio::test]
    async fn city_without_search_hits_is_not_found() {
        let (base, _) = serve(vec![("/nominatim/search", 200, "[]".to_string())]).await;

        let err = stats_for(&base).city_stats("Nowhere", "Iceland").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }
}
