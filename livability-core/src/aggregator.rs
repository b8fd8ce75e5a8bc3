//! Builds a [`CityEnvironmentReport`] from every upstream signal.
//!
//! Only a missing city and a failed weather fetch are fatal. Country, stats,
//! seismic and forecast lookups degrade to absent fields.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
    Config,
    comfort::{self, ComfortInputs, ComfortStrategy},
    error::ReportError,
    geo::{self, ReverseGeocoder, nominatim::NominatimClient},
    model::{CityEnvironmentReport, EconomicProfile, LocationQuery, SeismicProfile, WeatherObservation},
    provider::{ObservationFields, WeatherPayload, WeatherProvider, weather_provider_from_config},
    proxy::{LengthHashProxy, ProxyScoreProvider},
    seismic::{SeismicRiskModel, usgs::UsgsFeed},
    stats::{OpenDataStats, StatsSource},
    textgen::{TextGenerator, text_generator_from_config},
};

pub const FORECAST_INSTRUCTION: &str = "You are an assistant that generates a short weather forecast \
and a brief day comfort summary in English. You MUST use and PRESERVE the numeric values provided in \
the prompt exactly, and insert them into a readable sentence. Response format: one short line (not JSON) \
containing the temperature (°C), main conditions, humidity (%) and wind speed (m/s), plus a short tip \
(what to take, how to dress). The numeric values in the sentence must exactly match those in the prompt.";

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub comfort_strategy: ComfortStrategy,
    pub seismic_radius_km: u32,
    pub seismic_period_years: u32,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        let seismic = crate::config::SeismicConfig::default();
        Self {
            comfort_strategy: ComfortStrategy::default(),
            seismic_radius_km: seismic.radius_km,
            seismic_period_years: seismic.period_years,
        }
    }
}

#[derive(Debug)]
pub struct WeatherAggregator {
    weather: Box<dyn WeatherProvider>,
    proxy: Box<dyn ProxyScoreProvider>,
    geocoder: Box<dyn ReverseGeocoder>,
    stats: Box<dyn StatsSource>,
    seismic: Option<SeismicRiskModel>,
    text: Option<Box<dyn TextGenerator>>,
    settings: AggregatorSettings,
}

impl WeatherAggregator {
    /// Aggregator with the placeholder proxy scores and no seismic or forecast stage.
    pub fn new(
        weather: Box<dyn WeatherProvider>,
        geocoder: Box<dyn ReverseGeocoder>,
        stats: Box<dyn StatsSource>,
    ) -> Self {
        Self {
            weather,
            proxy: Box::new(LengthHashProxy),
            geocoder,
            stats,
            seismic: None,
            text: None,
            settings: AggregatorSettings::default(),
        }
    }

    /// Wire every production client from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let weather = weather_provider_from_config(config)?;
        let lookup_timeout = config.timeouts.lookup();
        let places = NominatimClient::new(&config.user_agent, lookup_timeout)?;
        let stats = OpenDataStats::new(places.clone(), lookup_timeout)?;

        let mut aggregator = Self::new(weather, Box::new(places), Box::new(stats))
            .with_settings(AggregatorSettings {
                comfort_strategy: config.comfort_strategy,
                seismic_radius_km: config.seismic.radius_km,
                seismic_period_years: config.seismic.period_years,
            });

        if config.seismic.enabled {
            aggregator = aggregator
                .with_seismic(SeismicRiskModel::new(Box::new(UsgsFeed::new(lookup_timeout)?)));
        }
        if let Some(text) = text_generator_from_config(config)? {
            aggregator = aggregator.with_text_generator(text);
        }
        Ok(aggregator)
    }

    pub fn with_proxy(mut self, proxy: Box<dyn ProxyScoreProvider>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_seismic(mut self, model: SeismicRiskModel) -> Self {
        self.seismic = Some(model);
        self
    }

    pub fn with_text_generator(mut self, text: Box<dyn TextGenerator>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_settings(mut self, settings: AggregatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn build_report(
        &self,
        city: &str,
        date: Option<NaiveDate>,
    ) -> Result<CityEnvironmentReport, ReportError> {
        self.build_report_on(city, date, Utc::now().date_naive()).await
    }

    /// Same as [`build_report`](Self::build_report) with an explicit "today".
    pub async fn build_report_on(
        &self,
        city: &str,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<CityEnvironmentReport, ReportError> {
        let query = LocationQuery::new(city, date)?;

        let payload = self
            .weather
            .fetch(&query)
            .await
            .map_err(ReportError::UpstreamUnavailable)?;

        let observation = match query.date {
            Some(date) => single_day_observation(&payload).ok_or_else(|| {
                ReportError::UpstreamUnavailable(anyhow::anyhow!(
                    "weather provider returned no day data for {date}"
                ))
            })?,
            None => current_observation(&payload),
        };

        let display_city = match query.date {
            Some(_) => query.city.clone(),
            None => payload
                .resolved_address
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| query.city.clone()),
        };

        let air = self.proxy.air_score(&query.city);
        let traffic = self.proxy.traffic_score(&query.city);
        let crime = self.proxy.crime_score(&query.city);

        let ((country, economy), seismic) = tokio::join!(
            self.economic_profile(&payload, &query.city),
            self.seismic_profile(&payload),
        );

        let formula = self.settings.comfort_strategy.select(economy.has_country_economy());
        let comfort_index = comfort::compute(
            formula,
            &ComfortInputs {
                temperature: observation.temperature,
                humidity: observation.humidity,
                wind_speed: observation.wind_speed,
                air_score: air,
                traffic_score: traffic,
                crime_score: crime,
                gdp_usd: economy.gdp_usd,
                population: economy.population_total,
            },
        );

        let report_date = query.date.unwrap_or(today);
        let mut report = CityEnvironmentReport {
            city: display_city,
            date: report_date.format("%d-%m-%Y").to_string(),
            temperature: observation.temperature,
            conditions: observation.conditions,
            air_purity: air,
            road_traffic: traffic,
            crime_risks: crime,
            life_comfort_index: comfort_index,
            comfort_strategy: formula,
            temp_max: observation.temperature_max,
            temp_min: observation.temperature_min,
            humidity: observation.humidity,
            wind_speed: observation.wind_speed,
            pressure: observation.pressure,
            hours: observation.hourly_breakdown,
            country,
            gdp_usd: economy.gdp_usd,
            population_total: economy.population_total,
            population_density: economy.population_density,
            city_population: economy.city_population,
            city_density: economy.city_density,
            economy_index: comfort::economy_index(economy.gdp_usd, economy.population_total),
            earthquake_risk: seismic.as_ref().map(|s| s.risk_score),
            earthquake_count: seismic.as_ref().map(|s| s.event_count),
            max_magnitude: seismic.as_ref().map(|s| s.max_magnitude),
            recent_earthquakes: seismic.map(|s| s.recent_events),
            ai_forecast: None,
        };

        // Forecast text only makes sense for today or later.
        if report_date >= today {
            if let Some(text) = &self.text {
                let prompt = forecast_prompt(&report, report_date);
                report.ai_forecast = Some(match text.generate(Some(FORECAST_INSTRUCTION), &prompt).await {
                    Ok(forecast) => forecast,
                    Err(err) => {
                        warn!(city = %report.city, error = %format!("{err:#}"), "forecast generation failed");
                        format!("generation error: {err:#}")
                    }
                });
            }
        }

        info!(
            city = %report.city,
            date = %report.date,
            comfort = report.life_comfort_index,
            formula = ?report.comfort_strategy,
            "built city report"
        );
        Ok(report)
    }

    async fn economic_profile(
        &self,
        payload: &WeatherPayload,
        city: &str,
    ) -> (Option<String>, EconomicProfile) {
        let mut profile = EconomicProfile::default();
        let Some(country) = geo::resolve_country(payload, self.geocoder.as_ref()).await else {
            return (None, profile);
        };

        let (country_stats, city_stats) = tokio::join!(
            self.stats.country_stats(&country),
            self.stats.city_stats(city, &country),
        );

        match country_stats {
            Ok(stats) => {
                profile.gdp_usd = stats.gdp_usd;
                profile.population_total = stats.population;
                profile.population_density = stats.density;
            }
            Err(err) => warn!(%country, error = %err, "country stats unavailable"),
        }
        match city_stats {
            Ok(stats) => {
                profile.city_population = stats.population;
                profile.city_density = stats.density();
            }
            Err(err) => warn!(city, %country, error = %err, "city stats unavailable"),
        }

        (Some(country), profile)
    }

    async fn seismic_profile(&self, payload: &WeatherPayload) -> Option<SeismicProfile> {
        let model = self.seismic.as_ref()?;
        let (lat, lon) = payload.coordinates()?;

        model
            .assess_risk(lat, lon, self.settings.seismic_radius_km, self.settings.seismic_period_years)
            .await
            .inspect_err(|err| warn!(lat, lon, error = %err, "seismic risk unavailable"))
            .ok()
    }
}

fn nonzero(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0)
}

fn single_day_observation(payload: &WeatherPayload) -> Option<WeatherObservation> {
    let day = payload.first_day()?;
    let temperature = nonzero(day.tempmax).or(nonzero(day.temp)).unwrap_or(0.0);

    Some(WeatherObservation {
        temperature,
        temperature_max: temperature,
        temperature_min: day.tempmin.unwrap_or(0.0),
        humidity: day.humidity.unwrap_or(0.0),
        wind_speed: day.windspeed.unwrap_or(0.0),
        pressure: day.pressure.unwrap_or(0.0),
        conditions: day.conditions.clone().unwrap_or_default(),
        hourly_breakdown: day.hours.clone().unwrap_or_default(),
    })
}

fn current_observation(payload: &WeatherPayload) -> WeatherObservation {
    let current = payload.current_conditions.as_ref();
    let day = payload.first_day();
    let pick = |field: fn(&ObservationFields) -> Option<f64>| {
        current.and_then(field).or_else(|| day.and_then(field))
    };

    let temp_max = day.and_then(|d| d.tempmax).unwrap_or(0.0);
    let temp_min = day.and_then(|d| d.tempmin).unwrap_or(0.0);

    let current_temp = nonzero(current.and_then(|c| c.temp))
        .or_else(|| nonzero(day.and_then(|d| d.temp)))
        .or_else(|| (temp_max != 0.0 || temp_min != 0.0).then(|| (temp_max + temp_min) / 2.0))
        .unwrap_or(0.0);

    let conditions = current
        .and_then(|c| c.conditions.clone())
        .filter(|c| !c.is_empty())
        .or_else(|| day.and_then(|d| d.conditions.clone()))
        .unwrap_or_default();

    let hourly_breakdown = current
        .and_then(|c| c.hours.clone())
        .filter(|h| !h.is_empty())
        .or_else(|| day.and_then(|d| d.hours.clone()))
        .unwrap_or_default();

    WeatherObservation {
        temperature: if temp_max != 0.0 { temp_max } else { current_temp },
        temperature_max: temp_max,
        temperature_min: temp_min,
        humidity: pick(|f| f.humidity).unwrap_or(0.0),
        wind_speed: pick(|f| f.windspeed).unwrap_or(0.0),
        pressure: pick(|f| f.pressure).unwrap_or(0.0),
        conditions,
        hourly_breakdown,
    }
}

fn forecast_prompt(report: &CityEnvironmentReport, date: NaiveDate) -> String {
    format!(
        "City: {}\nDate: {} (Year: {})\nTemperature_max: {:.1}\nHumidity: {:.1}\nWindSpeed: {:.1}\n\
         AirPurity: {}\nRoadTraffic: {}\nCrimeRisks: {}\nLifeComfortIndex: {:.1}\nConditions: {}",
        report.city,
        date.format("%Y-%m-%d"),
        date.year(),
        report.temperature,
        report.humidity,
        report.wind_speed,
        report.air_purity,
        report.road_traffic,
        report.crime_risks,
        report.life_comfort_index,
        report.conditions,
    )
}
