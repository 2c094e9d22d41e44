use chrono::{DateTime, Utc};

use crate::error::{ConfigError, RecordError};

/// Measurement unit system accepted by the OpenWeather API.
///
/// The tag determines the display unit for temperature and wind speed
/// fields only; everything else is unit-fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitSystem {
    Metric,
    Imperial,
    #[default]
    Standard,
}

impl UnitSystem {
    /// Value sent as the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            // The API calls the Kelvin-based system "standard"; older
            // configs say "default".
            "standard" | "default" => Ok(UnitSystem::Standard),
            _ => Err(ConfigError::UnknownUnitSystem(value.to_string())),
        }
    }
}

/// Closed set of measured quantities that carry a display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    TemperatureCurrent,
    TemperatureMin,
    TemperatureMax,
    TemperatureFeelsLike,
    WindSpeed,
    Humidity,
    Cloudiness,
    Pressure,
}

impl Measure {
    /// Display unit for this quantity under the given unit system.
    pub fn unit_label(self, units: UnitSystem) -> &'static str {
        match self {
            Measure::TemperatureCurrent
            | Measure::TemperatureMin
            | Measure::TemperatureMax
            | Measure::TemperatureFeelsLike => match units {
                UnitSystem::Metric => "°C",
                UnitSystem::Imperial => "°F",
                UnitSystem::Standard => "K",
            },
            Measure::WindSpeed => match units {
                UnitSystem::Imperial => "mph",
                UnitSystem::Metric | UnitSystem::Standard => "m/s",
            },
            Measure::Humidity | Measure::Cloudiness => "%",
            Measure::Pressure => "hPa",
        }
    }
}

/// 16-point compass rose, North first, clockwise in 22.5° steps.
const COMPASS_POINTS: [&str; 16] = [
    "North",
    "North-Northeast",
    "Northeast",
    "East-Northeast",
    "East",
    "East-Southeast",
    "Southeast",
    "South-Southeast",
    "South",
    "South-Southwest",
    "Southwest",
    "West-Southwest",
    "West",
    "West-Northwest",
    "Northwest",
    "North-Northwest",
];

/// Immutable snapshot of one city's current weather at fetch time.
///
/// Every upstream attribute is optional because the API omits fields
/// freely; a record with gaps is still valid. Instants are UTC.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherRecord {
    pub city: Option<String>,
    pub country: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub timezone_offset: Option<i64>,
    pub weather: Option<String>,
    pub weather_description: Option<String>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub temperature_current: Option<f64>,
    pub temperature_feels_like: Option<f64>,
    pub cloudiness: Option<i64>,
    pub wind_speed: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub humidity: Option<i64>,
    pub pressure: Option<i64>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub units: UnitSystem,
}

impl WeatherRecord {
    /// Validating constructor step: a present wind direction must lie in
    /// [0, 360).
    pub fn validated(self) -> Result<Self, RecordError> {
        if let Some(deg) = self.wind_direction_deg {
            if !(0.0..360.0).contains(&deg) {
                return Err(RecordError::WindDirectionOutOfRange(deg));
            }
        }

        Ok(self)
    }

    /// UTC offset rendered as "UTC", "UTC+N" or "UTC-N" (whole hours,
    /// floored).
    pub fn timezone_label(&self) -> Option<String> {
        let hours = self.timezone_offset?.div_euclid(3600);

        Some(match hours {
            0 => "UTC".to_string(),
            h if h > 0 => format!("UTC+{h}"),
            h => format!("UTC-{}", -h),
        })
    }

    /// Wind direction as a 16-point compass name.
    pub fn wind_compass(&self) -> Option<&'static str> {
        let deg = self.wind_direction_deg?;
        let ix = (deg / 22.5).round() as usize % 16;
        Some(COMPASS_POINTS[ix])
    }
}

/// Render an instant the way it appears in output rows.
pub fn format_instant(dt: DateTime<Utc>) -> String {
    dt.format("%d-%m-%Y %H:%M:%S").to_string()
}
