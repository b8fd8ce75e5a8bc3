//! Earthquake risk from a historical event feed.
//!
//! Each event contributes `10^(1.5 * magnitude)` energy, decayed by
//! `e^(-days_since / 365)`. The decayed total is normalised against a single
//! magnitude-7.0 event: `clamp(log10(total / reference + 1) * 50, 0, 100)`.
//!
//! Counting and the recent-event digest only look at events of magnitude 3.0
//! and above, while the energy sum keeps every non-negative magnitude.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use tracing::debug;

use crate::{
    error::LookupError,
    model::{QuakeSummary, SeismicProfile},
};

pub mod usgs;

pub const MIN_COUNTED_MAGNITUDE: f64 = 3.0;
const REFERENCE_MAGNITUDE: f64 = 7.0;
const DECAY_DAYS: f64 = 365.0;
const MAX_RECENT: usize = 10;
const MS_PER_DAY: f64 = 86_400_000.0;

/// One event as reported by the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuakeEvent {
    pub magnitude: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub time_ms: Option<i64>,
    pub place: Option<String>,
}

#[async_trait]
pub trait SeismicFeed: Send + Sync + Debug {
    async fn events(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        period_years: u32,
    ) -> anyhow::Result<Vec<QuakeEvent>>;
}

fn energy(magnitude: f64) -> f64 {
    10f64.powf(1.5 * magnitude)
}

/// Score a set of events as of `now`.
pub fn assess_events(events: &[QuakeEvent], now: DateTime<Utc>) -> SeismicProfile {
    let now_ms = now.timestamp_millis();

    let total_energy: f64 = events
        .iter()
        .map(|e| (e.magnitude.unwrap_or(0.0), e.time_ms.unwrap_or(0)))
        .filter(|(mag, _)| *mag >= 0.0)
        .map(|(mag, time_ms)| {
            // Clock skew must not turn decay into amplification.
            let days = (now_ms.saturating_sub(time_ms) as f64 / MS_PER_DAY).max(0.0);
            energy(mag) * (-days / DECAY_DAYS).exp()
        })
        .sum();

    let raw = (total_energy / energy(REFERENCE_MAGNITUDE) + 1.0).log10() * 50.0;
    let risk_score = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) };

    let mut counted: Vec<&QuakeEvent> = events
        .iter()
        .filter(|e| e.magnitude.unwrap_or(0.0) >= MIN_COUNTED_MAGNITUDE)
        .collect();

    let max_magnitude = counted
        .iter()
        .filter_map(|e| e.magnitude)
        .fold(0.0, f64::max);

    // Newest first; events without a time sort last.
    counted.sort_by(|a, b| b.time_ms.cmp(&a.time_ms));

    let recent_events = counted
        .iter()
        .take(MAX_RECENT)
        .map(|e| QuakeSummary {
            time: e.time_ms,
            magnitude: e.magnitude.unwrap_or(0.0),
            place: e.place.clone(),
        })
        .collect();

    SeismicProfile { risk_score, event_count: counted.len(), max_magnitude, recent_events }
}

#[derive(Debug)]
pub struct SeismicRiskModel {
    feed: Box<dyn SeismicFeed>,
}

impl SeismicRiskModel {
    pub fn new(feed: Box<dyn SeismicFeed>) -> Self {
        Self { feed }
    }

    pub async fn assess_risk(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        period_years: u32,
    ) -> Result<SeismicProfile, LookupError> {
        let events = self.feed.events(lat, lon, radius_km, period_years).await?;
        debug!(lat, lon, radius_km, period_years, events = events.len(), "scoring seismic events");
        Ok(assess_events(&events, Utc::now()))
    }
}
