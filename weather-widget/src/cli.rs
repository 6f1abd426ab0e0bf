use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Select, Text};
use std::{path::PathBuf, sync::Arc};

use weather_widget_core::{
    Config, LocationProvider, LocationSourceKind, OpenWeatherClient, ScreenSettings, WeatherScreen,
    WeatherSource,
    client::icon_url,
    screen::{humidity_text, temperature_text, wind_speed_text},
};

use crate::terminal::TerminalView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Current weather for where you are")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the API key, default place and location source.
    Configure,

    /// Print current weather for a place once and exit.
    Show {
        /// Place name, e.g. "Seoul".
        place: String,
    },

    /// Show the weather screen until Ctrl-C.
    Run {
        /// Place to show before the first location fix.
        #[arg(long)]
        place: Option<String>,

        /// Pin the position to this latitude.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Pin the position to this longitude.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Don't use location at all; stay on the default place.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_locate: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Configure => {
                configure(&mut config)?;
                let path = match &self.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Saved configuration to {}", path.display());
            }
            Command::Show { place } => show(&config, &place).await?,
            Command::Run {
                place,
                lat,
                lon,
                no_locate,
            } => {
                if let Some(place) = place {
                    config.default_place = place;
                }
                if let (Some(lat), Some(lon)) = (lat, lon) {
                    config.set_fixed_location(lat, lon);
                }
                if no_locate {
                    config.location.source = LocationSourceKind::Denied;
                }
                run_screen(&config).await?;
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;
    config.api_key = Some(api_key.trim().to_string());

    config.default_place = Text::new("Default place:")
        .with_default(&config.default_place)
        .prompt()
        .context("Default place prompt aborted")?;

    let sources = vec!["ip", "fixed", "denied"];
    let source = Select::new("Location source:", sources)
        .with_help_message("ip: approximate position from your IP address")
        .prompt()
        .context("Location source prompt aborted")?;

    match source {
        "fixed" => {
            let lat = CustomType::<f64>::new("Latitude:")
                .with_error_message("Please enter a number")
                .prompt()
                .context("Latitude prompt aborted")?;
            let lon = CustomType::<f64>::new("Longitude:")
                .with_error_message("Please enter a number")
                .prompt()
                .context("Longitude prompt aborted")?;
            config.set_fixed_location(lat, lon);
        }
        "denied" => config.location.source = LocationSourceKind::Denied,
        _ => config.location.source = LocationSourceKind::Ip,
    }

    Ok(())
}

async fn show(config: &Config, place: &str) -> anyhow::Result<()> {
    let api_key = config.api_key()?;
    let client = OpenWeatherClient::from_config(config)?;

    let obs = client
        .fetch(place, &api_key)
        .await
        .with_context(|| format!("Failed to fetch weather for '{place}'"))?;

    println!("{place}");
    println!("  {}", temperature_text(obs.temperature, config.units));
    println!("  {}", humidity_text(obs.humidity));
    println!("  {}", wind_speed_text(obs.wind_speed, config.units));
    println!("  {}", icon_url(&config.icon_base_url, &obs.icon_code));

    Ok(())
}

async fn run_screen(config: &Config) -> anyhow::Result<()> {
    let settings = ScreenSettings::from_config(config)?;
    let client = Arc::new(OpenWeatherClient::from_config(config)?);
    let (location, updates) = LocationProvider::from_config(config)?;

    let view = TerminalView::new(std::io::stdout());
    let screen = WeatherScreen::new(settings, view, client);

    screen
        .run(location, updates, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await;

    Ok(())
}
