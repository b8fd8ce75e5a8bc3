use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use livability_core::{
    AdviceComposer, CityEnvironmentReport, Config, ProviderId, WeatherAggregator, ask,
    parse_date, text_generator_from_config,
};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "livability", version, about = "City livability and comfort report")]
pub struct Cli {
    /// Log debug output from every stage to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "visualcrossing" or "gemini".
        provider: String,
    },

    /// Build the environment and comfort report for a city.
    Report {
        /// City name, optionally with region and country.
        city: String,

        /// DD-MM-YYYY or YYYY-MM-DD; current conditions when absent.
        #[arg(long)]
        date: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask for short improvement suggestions for a city.
    Advise {
        city: String,

        #[arg(long)]
        date: Option<String>,

        /// JSON object with the metrics to base the advice on.
        #[arg(long, default_value = "{}")]
        metrics: String,
    },

    /// Send a free-form prompt to the text generator.
    Ask {
        prompt: String,

        /// Replaces the default assistant instruction.
        #[arg(long)]
        instruction: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Report { city, date, json } => {
                let config = load_config()?;
                let date = date.as_deref().map(parse_date).transpose()?;

                let aggregator = WeatherAggregator::from_config(&config)?;
                let report = aggregator.build_report(&city, date).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
                Ok(())
            }
            Command::Advise { city, date, metrics } => {
                let config = load_config()?;
                let date = date.as_deref().map(parse_date).transpose()?;
                let metrics = parse_metrics(&metrics)?;

                let advice = AdviceComposer::from_config(&config)?
                    .compose(&city, date, &metrics)
                    .await?;
                println!("{advice}");
                Ok(())
            }
            Command::Ask { prompt, instruction } => {
                let config = load_config()?;
                let Some(generator) = text_generator_from_config(&config)? else {
                    let id = ProviderId::Gemini;
                    bail!(
                        "No API key configured for provider '{id}'.\n\
                         Hint: run `livability configure {id}` or set {}.",
                        id.env_var()
                    );
                };

                let answer = ask(generator.as_ref(), instruction.as_deref(), &prompt).await?;
                println!("{answer}");
                Ok(())
            }
        }
    }
}

/// Config file plus environment overrides.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load()?.with_env_overrides();
    debug!(
        path = %Config::config_file_path()?.display(),
        providers = ?configured_providers(&config),
        strategy = ?config.comfort_strategy,
        "loaded config"
    );
    Ok(config)
}

fn configured_providers(config: &Config) -> Vec<ProviderId> {
    ProviderId::all()
        .iter()
        .copied()
        .filter(|id| config.is_provider_configured(*id))
        .collect()
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if config.is_provider_configured(id) {
        println!("Provider '{id}' already has a key; entering a new one replaces it.");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_owned());
    config.save()?;
    println!("Saved key for '{id}' to {}", Config::config_file_path()?.display());
    Ok(())
}

fn parse_metrics(raw: &str) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--metrics must be valid JSON")?;
    if !value.is_object() {
        bail!("--metrics must be a JSON object");
    }
    Ok(value)
}

fn print_report(report: &CityEnvironmentReport) {
    println!("{} ({})", report.city, report.date);
    if let Some(country) = &report.country {
        println!("  Country:            {country}");
    }
    println!("  Temperature:        {:.1} °C", report.temperature);
    if report.temp_max != 0.0 || report.temp_min != 0.0 {
        println!("  Min / max:          {:.1} / {:.1} °C", report.temp_min, report.temp_max);
    }
    if !report.conditions.is_empty() {
        println!("  Conditions:         {}", report.conditions);
    }
    println!("  Humidity:           {:.1} %", report.humidity);
    println!("  Wind speed:         {:.1}", report.wind_speed);
    if report.pressure != 0.0 {
        println!("  Pressure:           {:.1} hPa", report.pressure);
    }

    println!("  Air purity:         {}", report.air_purity);
    println!("  Road traffic:       {}", report.road_traffic);
    println!("  Crime risks:        {}", report.crime_risks);
    println!(
        "  Comfort index:      {:.1} ({:?})",
        report.life_comfort_index, report.comfort_strategy
    );

    if let Some(index) = report.economy_index {
        println!("  Economy index:      {index:.1}");
    }
    if report.population_total > 0 {
        println!("  Country population: {}", report.population_total);
    }
    if report.city_population > 0 {
        println!("  City population:    {}", report.city_population);
    }
    if report.city_density > 0.0 {
        println!("  City density:       {:.1} /km²", report.city_density);
    }

    if let Some(risk) = report.earthquake_risk {
        println!(
            "  Earthquake risk:    {risk:.1} ({} events, max M{:.1})",
            report.earthquake_count.unwrap_or(0),
            report.max_magnitude.unwrap_or(0.0)
        );
    }
    if let Some(forecast) = &report.ai_forecast {
        println!();
        println!("{forecast}");
    }
}
