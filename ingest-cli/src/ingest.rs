//! Orchestration of one ingestion run.
//!
//! Cities are fetched sequentially; a city that exhausts its attempts is
//! recorded as failed and never aborts the batch. All collected records
//! are written in a single batch at the end of the run.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use ingest_core::{
    CityIndex, Config, OpenWeatherClient, Storage, config::CityEntry, normalize::normalize,
};

/// Initialize the process-wide tracing subscriber. Called once at startup;
/// the sink is stdout so orchestrators (cron, containers) capture it.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Check config and city list only; print the entries that would be
/// skipped.
pub fn validate(config_path: &Path, city_list_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("loading configuration")?;
    let index = CityIndex::load(city_list_path).context("loading city list")?;

    let (valid, invalid) = partition_cities(&config, &index);
    report_invalid(&invalid);
    println!("{} of {} configured cities are valid.", valid.len(), config.cities.len());

    Ok(())
}

/// Run the whole pipeline: validate cities, fetch each one, write one
/// partitioned batch, print the run summary.
pub async fn run(config_path: &Path, city_list_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("loading configuration")?;
    let api_key = Config::api_key_from_env()?;
    let index = CityIndex::load(city_list_path).context("loading city list")?;

    let (valid, invalid) = partition_cities(&config, &index);
    report_invalid(&invalid);

    let units = config.units()?;
    let client = OpenWeatherClient::new(
        config.api.base_url.clone(),
        api_key,
        units,
        Duration::from_secs(config.api.timeout_seconds),
        config.api.max_retries,
        Duration::from_secs(config.api.backoff_seconds),
    )?;

    let mut records = Vec::with_capacity(valid.len());
    let mut failed: Vec<String> = Vec::new();

    for city in &valid {
        let country = city.country.to_uppercase();
        info!(city = %city.name, %country, "fetching weather");

        match client.fetch_weather(&city.name, &country).await {
            Ok(raw) => match normalize(&city.name, &country, &raw, units) {
                Ok(record) => records.push(record),
                Err(err) => {
                    error!(city = %city.name, %country, error = %err, "invalid record");
                    failed.push(format!("{country}.{}", city.name));
                }
            },
            Err(err) => {
                error!(city = %city.name, %country, error = %err, "failed to fetch weather");
                failed.push(format!("{country}.{}", city.name));
            }
        }
    }

    let storage = Storage::new(
        config.storage.base_path.clone(),
        config.format()?,
        config.layout()?,
    );
    let written = storage.write(&records).context("writing record batch")?;

    info!(
        succeeded = records.len(),
        failed = failed.len(),
        files = written.len(),
        "ingestion finished"
    );

    println!();
    println!("Pipeline finished.");
    println!("Successful cities: {}", records.len());
    println!("Failed cities: {}", failed.len());

    if !failed.is_empty() {
        println!("Failed city identifiers (check names/country codes):");
        for id in &failed {
            println!(" - {id}");
        }
    }

    Ok(())
}

fn partition_cities<'a>(
    config: &'a Config,
    index: &CityIndex,
) -> (Vec<&'a CityEntry>, Vec<&'a CityEntry>) {
    config
        .cities
        .iter()
        .partition(|city| index.contains(&city.name, &city.country))
}

fn report_invalid(invalid: &[&CityEntry]) {
    if invalid.is_empty() {
        return;
    }

    println!("Skipping cities not present in the reference list:");
    for city in invalid {
        println!(" - {}.{}", city.country.to_uppercase(), city.name);
    }
}
