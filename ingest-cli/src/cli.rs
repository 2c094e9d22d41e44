use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ingest;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-ingest", version, about = "Weather ingestion pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch weather for every configured city and write one partitioned batch.
    Run {
        /// Path to the YAML run configuration.
        #[arg(long, default_value = "config/config.yaml")]
        config: PathBuf,

        /// Path to the OpenWeather city list used for validation.
        #[arg(long, default_value = "config/city.list.json")]
        city_list: PathBuf,
    },

    /// Check the configuration and city list without fetching anything.
    Validate {
        /// Path to the YAML run configuration.
        #[arg(long, default_value = "config/config.yaml")]
        config: PathBuf,

        /// Path to the OpenWeather city list used for validation.
        #[arg(long, default_value = "config/city.list.json")]
        city_list: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run { config, city_list } => ingest::run(&config, &city_list).await,
            Command::Validate { config, city_list } => ingest::validate(&config, &city_list),
        }
    }
}
