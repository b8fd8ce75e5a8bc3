//! Life comfort index.
//!
//! Two formulas are kept side by side:
//!
//! - [`ComfortFormula::Weighted`]: seven weighted factors, including humidity,
//!   wind and a log-scaled GDP-per-capita term.
//! - [`ComfortFormula::Unweighted`]: plain mean of temperature, air, traffic
//!   and crime comfort, with no economic term.
//!
//! [`ComfortStrategy::Auto`] picks the weighted formula when both country GDP
//! and population are known, and the unweighted one otherwise.

use serde::{Deserialize, Serialize};

/// Configured selection rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComfortStrategy {
    #[default]
    Auto,
    Weighted,
    Unweighted,
}

/// The formula that actually produced an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComfortFormula {
    Weighted,
    Unweighted,
}

impl ComfortStrategy {
    pub fn select(self, economy_known: bool) -> ComfortFormula {
        match self {
            ComfortStrategy::Weighted => ComfortFormula::Weighted,
            ComfortStrategy::Unweighted => ComfortFormula::Unweighted,
            ComfortStrategy::Auto if economy_known => ComfortFormula::Weighted,
            ComfortStrategy::Auto => ComfortFormula::Unweighted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComfortInputs {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub air_score: u8,
    pub traffic_score: u8,
    pub crime_score: u8,
    pub gdp_usd: f64,
    pub population: u64,
}

const IDEAL_TEMP_C: f64 = 21.0;
const IDEAL_HUMIDITY: f64 = 50.0;
/// Economic term used when GDP or population is unknown.
const NEUTRAL_ECONOMY: f64 = 50.0;

const W_TEMP: f64 = 0.22;
const W_HUMIDITY: f64 = 0.12;
const W_WIND: f64 = 0.06;
const W_AIR: f64 = 0.25;
const W_TRAFFIC: f64 = 0.15;
const W_CRIME: f64 = 0.15;
const W_ECONOMY: f64 = 0.05;

fn clamp_score(v: f64) -> f64 {
    // NaN maps to 0.
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `log10(gdp / population + 1) * 20`, clamped. `None` when either figure is unknown.
pub fn economy_index(gdp_usd: f64, population: u64) -> Option<f64> {
    if gdp_usd <= 0.0 || population == 0 {
        return None;
    }
    let per_capita = gdp_usd / population as f64;
    Some(clamp_score((per_capita + 1.0).log10() * 20.0))
}

pub fn compute(formula: ComfortFormula, inputs: &ComfortInputs) -> f64 {
    match formula {
        ComfortFormula::Weighted => weighted(inputs),
        ComfortFormula::Unweighted => unweighted(inputs),
    }
}

fn inverse(score: u8) -> f64 {
    clamp_score(100.0 - f64::from(score))
}

pub fn weighted(inputs: &ComfortInputs) -> f64 {
    let temp = clamp_score(100.0 - 4.0 * (inputs.temperature - IDEAL_TEMP_C).abs());
    let humidity = clamp_score(100.0 - 2.0 * (inputs.humidity - IDEAL_HUMIDITY).abs());
    let wind = clamp_score(100.0 - 5.0 * inputs.wind_speed);
    let air = clamp_score(f64::from(inputs.air_score));
    let economy = economy_index(inputs.gdp_usd, inputs.population).unwrap_or(NEUTRAL_ECONOMY);

    let score = W_TEMP * temp
        + W_HUMIDITY * humidity
        + W_WIND * wind
        + W_AIR * air
        + W_TRAFFIC * inverse(inputs.traffic_score)
        + W_CRIME * inverse(inputs.crime_score)
        + W_ECONOMY * economy;

    round1(clamp_score(score))
}

pub fn unweighted(inputs: &ComfortInputs) -> f64 {
    let temp = clamp_score(100.0 - 5.0 * (inputs.temperature - IDEAL_TEMP_C).abs());
    let air = clamp_score(f64::from(inputs.air_score));

    let mean = (temp + air + inverse(inputs.traffic_score) + inverse(inputs.crime_score)) / 4.0;
    round1(clamp_score(mean))
}
