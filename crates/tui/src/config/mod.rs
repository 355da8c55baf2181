use std::path::PathBuf;

use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use engine::Palette;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/finboard.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartColors {
    #[default]
    Stable,
    Shuffle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub identifier: String,
    pub timezone: String,
    pub page_size: u32,
    pub chart_colors: ChartColors,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1337/api".to_string(),
            identifier: String::new(),
            timezone: "UTC".to_string(),
            page_size: engine::listing::DEFAULT_PAGE_SIZE,
            chart_colors: ChartColors::Stable,
            log_level: "info".to_string(),
            log_file: PathBuf::from("finboard.log"),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|err| {
            config::ConfigError::Message(format!("invalid timezone {}: {err}", self.timezone))
                .into()
        })
    }

    /// Palette for one dashboard refresh.
    pub fn palette(&self) -> Palette {
        match self.chart_colors {
            ChartColors::Stable => Palette::Stable,
            ChartColors::Shuffle => {
                let now = chrono::Utc::now();
                Palette::Shuffled(now.timestamp() as u64 ^ u64::from(now.timestamp_subsec_nanos()))
            }
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "finboard", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL of the REST API (e.g. http://127.0.0.1:1337/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Prefill the sign-in e-mail (password is never read from CLI).
    #[arg(long)]
    identifier: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the dashboard series of a saved transactions response as JSON.
    Report {
        /// File holding the body of `GET /transactions?populate=*`.
        #[arg(long)]
        input: PathBuf,
        /// Year of the monthly series (defaults to the current year).
        #[arg(long)]
        year: Option<i32>,
    },
}

pub fn load() -> Result<(AppConfig, Option<Command>)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("FINBOARD"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(identifier) = args.identifier {
        settings.identifier = identifier;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    settings.page_size = settings.page_size.max(1);

    Ok((settings, args.command))
}
