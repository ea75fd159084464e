use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};
use serde_json::json;
use weather_core::{Config, DEFAULT_HISTORY_DAYS, Units, WeatherClient};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print API usage and key health after the command.
    #[arg(long, global = true)]
    pub stats: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure API keys and units interactively.
    Configure,

    /// Show current conditions for a city.
    Current {
        /// City name.
        city: String,
    },

    /// Show the hourly and daily forecast for a city.
    Forecast {
        /// City name.
        city: String,

        /// Number of hourly rows to show.
        #[arg(long, default_value_t = 24)]
        hours: usize,

        /// Number of daily rows to show.
        #[arg(long, default_value_t = 7)]
        days: usize,
    },

    /// Show recent weather history for a city.
    History {
        /// City name.
        city: String,

        /// Days to look back.
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
    },

    /// Fetch current, forecast and history for a city at once.
    Overview {
        /// City name.
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if let Command::Configure = self.command {
            return configure();
        }

        let config = Config::load_with_env()?;
        tracing::debug!(keys = config.api_keys.len(), base_url = config.base_url(), "configuration loaded");
        let client = WeatherClient::from_config(&config)?;
        let units = config.units;

        let result = self.fetch(&client, units).await;

        if self.stats {
            if self.json {
                let stats = json!({ "usage": client.usage(), "keyHealth": client.key_health() });
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("\n{}\n\n{}", render::usage(&client.usage()), render::key_health(&client.key_health()));
            }
        }

        result
    }

    async fn fetch(&self, client: &WeatherClient, units: Option<Units>) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure => {}
            Command::Current { city } => {
                let current = client.current_weather(city).await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&current)?);
                } else {
                    println!("{}", render::current(city, &current, units));
                }
            }
            Command::Forecast { city, hours, days } => {
                let bundle = client.forecast(city).await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&bundle)?);
                } else {
                    println!("{}", render::forecast(city, &bundle, *hours, *days, units));
                }
            }
            Command::History { city, days } => {
                let bundle = client.historical_weather(city, *days).await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&bundle)?);
                } else {
                    println!("{}", render::history(city, &bundle, units));
                }
            }
            Command::Overview { city } => {
                let (current, forecast, history) = tokio::join!(
                    client.current_weather(city),
                    client.forecast(city),
                    client.historical_weather(city, DEFAULT_HISTORY_DAYS),
                );

                let failures = [current.as_ref().err(), forecast.as_ref().err(), history.as_ref().err()]
                    .into_iter()
                    .flatten()
                    .count();

                if self.json {
                    let out = json!({
                        "current": as_json(&current)?,
                        "forecast": as_json(&forecast)?,
                        "history": as_json(&history)?,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    let mut sections = Vec::new();
                    match &current {
                        Ok(c) => sections.push(render::current(city, c, units)),
                        Err(e) => sections.push(render::error_panel(e)),
                    }
                    match &forecast {
                        Ok(f) => sections.push(render::forecast(city, f, 12, 7, units)),
                        Err(e) => sections.push(render::error_panel(e)),
                    }
                    match &history {
                        Ok(h) => sections.push(render::history(city, h, units)),
                        Err(e) => sections.push(render::error_panel(e)),
                    }
                    println!("{}", sections.join("\n\n"));
                }

                if failures > 0 {
                    return Err(anyhow!("{failures} of 3 requests for '{city}' failed"));
                }
            }
        }

        Ok(())
    }
}

/// Successful payloads as-is, failures as `{ "error": { kind, message } }`.
fn as_json<T: serde::Serialize>(
    result: &Result<T, weather_core::ClassifiedError>,
) -> serde_json::Result<serde_json::Value> {
    match result {
        Ok(value) => serde_json::to_value(value),
        Err(e) => Ok(json!({ "error": { "kind": e.kind(), "message": e.message() } })),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let path = Config::config_file_path()?;
    println!("Configuring weather CLI ({})", path.display());

    if !config.api_keys.is_empty() {
        let keep = Confirm::new(&format!("Keep the {} configured API key(s)?", config.api_keys.len()))
            .with_default(true)
            .prompt()
            .context("Prompt cancelled")?;
        if !keep {
            config.api_keys.clear();
            config.fallback = Default::default();
        }
    }

    loop {
        let label = format!("API key #{} (leave empty to finish):", config.api_keys.len() + 1);
        let key = Password::new(&label)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Prompt cancelled")?;

        if key.trim().is_empty() {
            break;
        }
        if !config.add_api_key(key) {
            println!("That key is already configured.");
        }
    }

    if config.api_keys.is_empty() {
        return Err(anyhow!("At least one API key is required"));
    }

    let options = vec![Units::Metric, Units::Imperial];
    let cursor = match config.units {
        Some(Units::Imperial) => 1,
        _ => 0,
    };
    let units = Select::new("Units:", options)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Prompt cancelled")?;
    config.units = Some(units);

    // Validates the fallback table against the new key list before saving.
    config.key_registry()?;
    config.save()?;

    println!("Saved {} API key(s) to {}", config.api_keys.len(), path.display());
    Ok(())
}
