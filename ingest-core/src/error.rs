use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems. All of these are fatal at startup, before any
/// fetch attempt or file write.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse city list {}: {source}", path.display())]
    CityList {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("OPENWEATHER_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unsupported unit system '{0}'. Supported: metric, imperial, standard, default")]
    UnknownUnitSystem(String),

    #[error("unsupported format '{0}'. Supported: csv, json, parquet")]
    UnknownFormat(String),

    #[error(
        "unsupported layout '{0}'. Supported: date, date_country, country_date, hive_compact, city_date"
    )]
    UnknownLayout(String),
}

/// Failures of the fetch client.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Terminal per-city failure: every attempt was spent.
    #[error("failed to fetch weather for {query} after {attempts} attempts: {last_error}")]
    Exhausted {
        query: String,
        attempts: u32,
        last_error: String,
    },
}

/// Violation of a record invariant at construction time.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("wind direction {0} is out of range [0, 360)")]
    WindDirectionOutOfRange(f64),
}

/// Failures of the partitioned writer. A group write error aborts the
/// remaining groups; files already written stay in place.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: arrow::error::ArrowError,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },
}
