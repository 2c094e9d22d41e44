//! Partitioned persistence of weather record batches.
//!
//! One write call turns a batch into Hive-style directory partitions and
//! a set of files stamped with a single run timestamp. Grouping is an
//! explicit two-pass algorithm: compute a partition key per record, then
//! bucket records by key in first-occurrence order and serialize each
//! bucket independently.

mod frame;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{ConfigError, StorageError};
use crate::model::WeatherRecord;

/// On-disk serialization format for record batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    JsonLines,
    Parquet,
}

impl FileFormat {
    /// File extension; also the tag accepted in configuration.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::JsonLines => "json",
            FileFormat::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl TryFrom<&str> for FileFormat {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::JsonLines),
            "parquet" => Ok(FileFormat::Parquet),
            _ => Err(ConfigError::UnknownFormat(value.to_string())),
        }
    }
}

/// Directory layout policy for partitioned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionLayout {
    /// `year=Y/month=M/day=D/weather_{run_ts}`
    Date,
    /// `year=Y/month=M/day=D/{country}_weather_{run_ts}`
    DateCountry,
    /// `{country}/year=Y/month=M/day=D/weather_{run_ts}`
    CountryDate,
    /// One file per record: `year=Y/month=M/day=D/{country}/{city}/{country}_{city}_{run_ts}`
    HiveCompact,
    /// `{city}/year=Y/month=M/day=D/weather_{run_ts}`
    CityDate,
}

impl PartitionLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionLayout::Date => "date",
            PartitionLayout::DateCountry => "date_country",
            PartitionLayout::CountryDate => "country_date",
            PartitionLayout::HiveCompact => "hive_compact",
            PartitionLayout::CityDate => "city_date",
        }
    }
}

impl std::fmt::Display for PartitionLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PartitionLayout {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "date" => Ok(PartitionLayout::Date),
            "date_country" => Ok(PartitionLayout::DateCountry),
            "country_date" => Ok(PartitionLayout::CountryDate),
            "hive_compact" => Ok(PartitionLayout::HiveCompact),
            "city_date" => Ok(PartitionLayout::CityDate),
            _ => Err(ConfigError::UnknownLayout(value.to_string())),
        }
    }
}

/// Grouping key computed per record in the first pass. `Record` carries
/// the batch index so every record forms its own group under
/// `hive_compact`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Date(NaiveDate),
    DateCountry(NaiveDate, String),
    CountryDate(String, NaiveDate),
    Record(usize, NaiveDate, String, String),
    CityDate(String, NaiveDate),
}

/// Writes record batches under a base path in the configured format and
/// layout.
#[derive(Debug, Clone)]
pub struct Storage {
    base_path: PathBuf,
    format: FileFormat,
    layout: PartitionLayout,
}

impl Storage {
    pub fn new(base_path: impl Into<PathBuf>, format: FileFormat, layout: PartitionLayout) -> Self {
        Self {
            base_path: base_path.into(),
            format,
            layout,
        }
    }

    /// Write one batch, stamping files with the current UTC instant.
    pub fn write(&self, records: &[WeatherRecord]) -> Result<Vec<PathBuf>, StorageError> {
        self.write_at(records, Utc::now())
    }

    /// Write one batch with an explicit run instant.
    ///
    /// Every file produced by the call shares the instant's
    /// `YYYYMMDD_HHMMSS` stamp, so repeating a run adds files instead of
    /// overwriting earlier ones. An empty batch is a no-op: no directories
    /// are created. Returns the paths written, in group order.
    pub fn write_at(
        &self,
        records: &[WeatherRecord],
        run_at: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let run_ts = run_at.format("%Y%m%d_%H%M%S").to_string();

        // Pass one: a partition key per record. Records the layout cannot
        // place (no observation timestamp, or a missing country/city the
        // layout keys on) are excluded from the whole write.
        let mut groups: IndexMap<GroupKey, Vec<&WeatherRecord>> = IndexMap::new();
        let mut excluded = 0usize;

        for (ix, record) in records.iter().enumerate() {
            match self.group_key(ix, record) {
                Some(key) => groups.entry(key).or_default().push(record),
                None => excluded += 1,
            }
        }

        if excluded > 0 {
            warn!(
                excluded,
                layout = %self.layout,
                "records excluded from write: missing observation timestamp or partition field"
            );
        }

        // Pass two: one file per bucket. An error aborts the remaining
        // buckets; files already written stay in place.
        let mut written = Vec::with_capacity(groups.len());

        for (key, bucket) in &groups {
            let (rel_dir, filename) = self.target(key, &run_ts);
            let dir = self.base_path.join(rel_dir);

            fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;

            let path = dir.join(filename);
            frame::write_records(&path, self.format, bucket)?;
            info!(path = %path.display(), rows = bucket.len(), "wrote partition file");
            written.push(path);
        }

        Ok(written)
    }

    fn group_key(&self, ix: usize, record: &WeatherRecord) -> Option<GroupKey> {
        // The partition date always comes from the observation timestamp,
        // never sunrise/sunset.
        let date = record.timestamp?.date_naive();

        match self.layout {
            PartitionLayout::Date => Some(GroupKey::Date(date)),
            PartitionLayout::DateCountry => {
                Some(GroupKey::DateCountry(date, record.country.clone()?))
            }
            PartitionLayout::CountryDate => {
                Some(GroupKey::CountryDate(record.country.clone()?, date))
            }
            PartitionLayout::HiveCompact => Some(GroupKey::Record(
                ix,
                date,
                record.country.clone()?,
                record.city.clone()?,
            )),
            PartitionLayout::CityDate => Some(GroupKey::CityDate(record.city.clone()?, date)),
        }
    }

    fn target(&self, key: &GroupKey, run_ts: &str) -> (PathBuf, String) {
        let ext = self.format.extension();

        match key {
            GroupKey::Date(date) => (date_dir(*date), format!("weather_{run_ts}.{ext}")),
            GroupKey::DateCountry(date, country) => (
                date_dir(*date),
                format!("{country}_weather_{run_ts}.{ext}"),
            ),
            GroupKey::CountryDate(country, date) => (
                PathBuf::from(country).join(date_dir(*date)),
                format!("weather_{run_ts}.{ext}"),
            ),
            GroupKey::Record(_, date, country, city) => (
                date_dir(*date).join(country).join(city),
                format!("{country}_{city}_{run_ts}.{ext}"),
            ),
            GroupKey::CityDate(city, date) => (
                PathBuf::from(city).join(date_dir(*date)),
                format!("weather_{run_ts}.{ext}"),
            ),
        }
    }
}

/// Hive-style date segments, unpadded: `year=2024/month=1/day=7`.
fn date_dir(date: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "year={}/month={}/day={}",
        date.year(),
        date.month(),
        date.day()
    ))
}
