use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;
use crate::model::UnitSystem;
use crate::storage::{FileFormat, PartitionLayout};

/// Environment variable holding the OpenWeather credential.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Top-level run configuration, loaded from a YAML file.
///
/// Example:
/// ```yaml
/// api:
///   base_url: https://api.openweathermap.org/data/2.5/weather
///   units: metric
///   timeout_seconds: 10
///   max_retries: 3
///   backoff_seconds: 2
/// cities:
///   - name: Lisbon
///     country: PT
/// storage:
///   base_path: data
///   format: csv
///   layout: date
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub cities: Vec<CityEntry>,
    pub storage: StorageConfig,
}

/// Fetch client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub units: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_seconds: u64,
}

/// One city to ingest. `country` is an ISO 3166 two-letter code.
#[derive(Debug, Clone, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub country: String,
}

/// Writer settings; `format` and `layout` are closed-enumeration tags.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_path: PathBuf,
    pub format: String,
    pub layout: String,
}

impl Config {
    /// Load and validate configuration from disk. Any problem here is
    /// fatal, before a single fetch attempt.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.max_retries < 1 {
            return Err(ConfigError::Invalid(
                "api.max_retries must be at least 1".to_string(),
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        // Tags must resolve into their closed enumerations up front.
        self.units()?;
        self.format()?;
        self.layout()?;

        Ok(())
    }

    pub fn units(&self) -> Result<UnitSystem, ConfigError> {
        UnitSystem::try_from(self.api.units.as_str())
    }

    pub fn format(&self) -> Result<FileFormat, ConfigError> {
        FileFormat::try_from(self.storage.format.as_str())
    }

    pub fn layout(&self) -> Result<PartitionLayout, ConfigError> {
        PartitionLayout::try_from(self.storage.layout.as_str())
    }

    /// Read the API credential from the environment. Absence is fatal at
    /// startup.
    pub fn api_key_from_env() -> Result<String, ConfigError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Canonical key for comparing configured names against the reference
/// list. Full Unicode folding is the reference dataset's concern; here a
/// trimmed, lowercased name is enough.
pub fn normalize_city(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Reference set of `(city, country)` pairs built from the OpenWeather
/// `city.list.json` bulk file. Cities absent from the set are skipped
/// before any fetch.
#[derive(Debug, Clone)]
pub struct CityIndex {
    entries: HashSet<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct CityListEntry {
    name: String,
    country: String,
}

impl CityIndex {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let list: Vec<CityListEntry> =
            serde_json::from_str(&contents).map_err(|source| ConfigError::CityList {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::from_entries(
            list.into_iter().map(|entry| (entry.name, entry.country)),
        ))
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, country)| (normalize_city(&name), country.to_uppercase()))
            .collect();

        Self { entries }
    }

    pub fn contains(&self, city: &str, country: &str) -> bool {
        self.entries
            .contains(&(normalize_city(city), country.to_uppercase()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_YAML: &str = "\
api:
  base_url: https://api.openweathermap.org/data/2.5/weather
  units: metric
  timeout_seconds: 10
  max_retries: 3
  backoff_seconds: 2
cities:
  - name: Lisbon
    country: PT
  - name: Porto
    country: pt
storage:
  base_path: data
  format: csv
  layout: date
";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_valid_config() {
        let file = write_config(VALID_YAML);
        let cfg = Config::load(file.path()).expect("config must load");

        assert_eq!(cfg.api.max_retries, 3);
        assert_eq!(cfg.cities.len(), 2);
        assert_eq!(cfg.units().unwrap(), UnitSystem::Metric);
        assert_eq!(cfg.format().unwrap(), FileFormat::Csv);
        assert_eq!(cfg.layout().unwrap(), PartitionLayout::Date);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn zero_retries_is_rejected() {
        let file = write_config(&VALID_YAML.replace("max_retries: 3", "max_retries: 0"));
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn unknown_tags_are_rejected_at_load() {
        let file = write_config(&VALID_YAML.replace("format: csv", "format: orc"));
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported format 'orc'"));

        let file = write_config(&VALID_YAML.replace("layout: date", "layout: bogus"));
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported layout 'bogus'"));

        let file = write_config(&VALID_YAML.replace("units: metric", "units: cubits"));
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported unit system 'cubits'"));
    }

    #[test]
    fn city_index_normalizes_name_and_country() {
        let index = CityIndex::from_entries([
            ("Lisbon".to_string(), "pt".to_string()),
            ("Porto".to_string(), "PT".to_string()),
        ]);

        assert_eq!(index.len(), 2);
        assert!(index.contains("  lisbon ", "PT"));
        assert!(index.contains("PORTO", "pt"));
        assert!(!index.contains("Lisbon", "ES"));
        assert!(!index.contains("Madrid", "ES"));
    }

    #[test]
    fn city_index_loads_reference_json() {
        let file = write_config(
            r#"[
                {"id": 2267057, "name": "Lisbon", "state": "", "country": "PT",
                 "coord": {"lon": -9.13333, "lat": 38.71667}},
                {"id": 2735943, "name": "Porto", "state": "", "country": "PT",
                 "coord": {"lon": -8.61099, "lat": 41.14961}}
            ]"#,
        );

        let index = CityIndex::load(file.path()).expect("city list must load");
        assert!(index.contains("Lisbon", "PT"));
        assert!(!index.is_empty());
    }
}
