//! Core library for the `livability` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstractions over the weather, geocoding, statistics, seismic and text-generation upstreams
//! - The comfort and seismic scoring models
//! - The report aggregator and the advice composer
//!
//! It is used by `livability-cli`, but can also be reused by other binaries or services.

pub mod advice;
pub mod aggregator;
pub mod comfort;
pub mod config;
pub mod error;
pub mod geo;
pub mod model;
pub mod provider;
pub mod proxy;
pub mod seismic;
pub mod stats;
pub mod textgen;

mod http;

pub use advice::AdviceComposer;
pub use aggregator::{AggregatorSettings, WeatherAggregator};
pub use comfort::{ComfortFormula, ComfortStrategy};
pub use config::{Config, ProviderConfig};
pub use error::{LookupError, ReportError};
pub use model::{CityEnvironmentReport, LocationQuery, parse_date};
pub use provider::{ProviderId, WeatherProvider};
pub use textgen::{TextGenerator, ask, text_generator_from_config};
