use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use farmcast_core::{
    CanonicalWeatherReading, Config, CurrentQuery, ProviderId, UnitSystem, WeatherService,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "farmcast",
    version,
    about = "Current weather from whichever provider is configured"
)]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a provider.
    Configure {
        /// Provider short name: "openweather" or "google".
        provider: String,
    },

    /// Print current conditions for a coordinate.
    Current {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        #[arg(long, allow_hyphen_values = true)]
        lon: String,

        /// standard, metric or imperial.
        #[arg(long, default_value = "metric")]
        units: String,

        /// Print the raw response envelope instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Serve GET /weather/current and GET /weather over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Configure { provider } => configure(&config_path, &provider),
            Command::Current {
                lat,
                lon,
                units,
                json,
            } => {
                let service = WeatherService::new(load_config(&config_path)?)?;
                let reply = service
                    .current(&CurrentQuery {
                        lat: Some(lat),
                        lon: Some(lon),
                        units: Some(units),
                    })
                    .await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&reply.envelope)?);
                }

                match reply.envelope.data {
                    Some(reading) => {
                        if !json {
                            print!("{}", render(&reading));
                        }
                        Ok(())
                    }
                    None => Err(anyhow!(
                        "{}",
                        reply
                            .envelope
                            .error
                            .unwrap_or_else(|| "Unknown error".to_string())
                    )),
                }
            }
            Command::Serve { bind } => {
                let service = WeatherService::new(load_config(&config_path)?)?;
                crate::server::serve(bind, service).await
            }
        }
    }
}

fn load_config(path: &std::path::Path) -> anyhow::Result<Config> {
    Ok(Config::load_from(path)?.with_env_overrides())
}

fn configure(path: &std::path::Path, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_api_key() {
        println!("{id} needs no API key; nothing to configure.");
        return Ok(());
    }

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    // Read the file alone; keys from the environment must not end up on disk.
    let mut cfg = Config::load_from(path)?;
    cfg.upsert_provider_api_key(id, api_key.trim().to_string());
    cfg.save_to(path)?;

    println!("Saved API key for {id} to {}", path.display());
    Ok(())
}

fn unit_labels(units: UnitSystem) -> (&'static str, &'static str) {
    match units {
        UnitSystem::Standard => ("K", "m/s"),
        UnitSystem::Metric => ("°C", "m/s"),
        UnitSystem::Imperial => ("°F", "mph"),
    }
}

/// Human-readable summary of a reading.
pub fn render(reading: &CanonicalWeatherReading) -> String {
    let (temp_unit, speed_unit) = unit_labels(reading.units);
    let t = &reading.temperature;

    let place = reading.place_name.as_deref().unwrap_or("Current location");
    let conditions = reading
        .conditions
        .iter()
        .map(|c| c.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let observed = i32::try_from(reading.timezone_offset_secs)
        .ok()
        .and_then(FixedOffset::east_opt)
        .zip(DateTime::from_timestamp(reading.observed_at, 0))
        .map(|(offset, utc)| utc.with_timezone(&offset).format("%Y-%m-%d %H:%M %:z").to_string())
        .unwrap_or_else(|| reading.observed_at.to_string());

    format!(
        "{place} ({:.4}, {:.4}) via {}\n\
         {conditions}\n\
         Temperature {:.1}{temp_unit} (feels like {:.1}{temp_unit}, range {:.1}..{:.1})\n\
         Humidity {:.0}%  Pressure {:.0} hPa  Visibility {:.0} m\n\
         Wind {:.1} {speed_unit} from {:.0}°  Clouds {:.0}%\n\
         Observed {observed}\n",
        reading.location.lat,
        reading.location.lon,
        reading.source,
        t.current,
        t.feels_like,
        t.min,
        t.max,
        reading.atmosphere.humidity,
        reading.atmosphere.pressure,
        reading.atmosphere.visibility,
        reading.wind.speed,
        reading.wind.direction_degrees,
        reading.clouds.coverage_percent,
    )
}
