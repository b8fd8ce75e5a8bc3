use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf, time::Duration};

use crate::{comfort::ComfortStrategy, provider::ProviderId};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Seismic assessment parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeismicConfig {
    pub enabled: bool,
    pub radius_km: u32,
    pub period_years: u32,
}

impl Default for SeismicConfig {
    fn default() -> Self {
        Self { enabled: true, radius_km: 300, period_years: 5 }
    }
}

/// Per-upstream request timeouts, in seconds. Zero is raised to one second.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub weather_secs: u64,
    /// Country registry, economic indicators, place lookup and seismic feed.
    pub lookup_secs: u64,
    pub generation_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { weather_secs: 15, lookup_secs: 10, generation_secs: 15 }
    }
}

const MIN_TIMEOUT_SECS: u64 = 1;

fn bounded(secs: u64) -> Duration {
    Duration::from_secs(secs.max(MIN_TIMEOUT_SECS))
}

impl TimeoutConfig {
    pub fn weather(&self) -> Duration {
        bounded(self.weather_secs)
    }

    pub fn lookup(&self) -> Duration {
        bounded(self.lookup_secs)
    }

    pub fn generation(&self) -> Duration {
        bounded(self.generation_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which comfort-index formula to use: "auto", "weighted" or "unweighted".
    pub comfort_strategy: ComfortStrategy,

    /// Sent with every place-lookup request; the service rejects anonymous clients.
    pub user_agent: String,

    pub seismic: SeismicConfig,

    pub timeouts: TimeoutConfig,

    /// Example TOML:
    /// [providers.visualcrossing]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            comfort_strategy: ComfortStrategy::default(),
            user_agent: default_user_agent(),
            seismic: SeismicConfig::default(),
            timeouts: TimeoutConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("livability/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "livability", "livability-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply API keys from `VISUAL_CROSSING_KEY` / `GEMINI_API_KEY`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for id in ProviderId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                self.providers
                    .insert(id.as_str().to_string(), ProviderConfig { api_key: key });
            }
        }
        self
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}
