//! Core library for the weather ingestion pipeline.
//!
//! This crate defines:
//! - Run configuration & city reference validation
//! - The retry-governed OpenWeather fetch client
//! - Normalization of raw payloads into canonical weather records
//! - The partitioned batch writer (CSV, line-delimited JSON, Parquet)
//!
//! It is used by `ingest-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod storage;

pub use client::OpenWeatherClient;
pub use config::{CityIndex, Config};
pub use error::{ConfigError, FetchError, RecordError, StorageError};
pub use model::{Measure, UnitSystem, WeatherRecord};
pub use normalize::normalize;
pub use storage::{FileFormat, PartitionLayout, Storage};
