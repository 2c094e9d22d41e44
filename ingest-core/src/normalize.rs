//! Mapping of raw OpenWeather payloads into canonical records.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::RecordError;
use crate::extract::{
    PathSeg::{Index, Key},
    extract_f64, extract_i64, extract_str,
};
use crate::model::{UnitSystem, WeatherRecord};

/// Build a [`WeatherRecord`] from a raw response body.
///
/// Field gaps in the payload become `None`; a sparse record is still
/// valid, and a city only fails when the fetch itself failed. City and
/// country identify the request, not the payload. Upstream wind bearings
/// are wrapped into [0, 360) before the record invariant is checked, so a
/// reported 360° becomes 0° (due North).
pub fn normalize(
    city: &str,
    country: &str,
    raw: &Value,
    units: UnitSystem,
) -> Result<WeatherRecord, RecordError> {
    let record = WeatherRecord {
        city: Some(city.to_string()),
        country: Some(country.to_uppercase()),
        timestamp: extract_i64(raw, &[Key("dt")]).and_then(epoch_to_utc),
        timezone_offset: extract_i64(raw, &[Key("timezone")]),
        weather: extract_str(raw, &[Key("weather"), Index(0), Key("main")]).map(str::to_string),
        weather_description: extract_str(raw, &[Key("weather"), Index(0), Key("description")])
            .map(str::to_string),
        temperature_min: extract_f64(raw, &[Key("main"), Key("temp_min")]),
        temperature_max: extract_f64(raw, &[Key("main"), Key("temp_max")]),
        temperature_current: extract_f64(raw, &[Key("main"), Key("temp")]),
        temperature_feels_like: extract_f64(raw, &[Key("main"), Key("feels_like")]),
        cloudiness: extract_i64(raw, &[Key("clouds"), Key("all")]),
        wind_speed: extract_f64(raw, &[Key("wind"), Key("speed")]),
        wind_direction_deg: extract_f64(raw, &[Key("wind"), Key("deg")])
            .map(|deg| deg.rem_euclid(360.0)),
        humidity: extract_i64(raw, &[Key("main"), Key("humidity")]),
        pressure: extract_i64(raw, &[Key("main"), Key("pressure")]),
        sunrise: extract_i64(raw, &[Key("sys"), Key("sunrise")]).and_then(epoch_to_utc),
        sunset: extract_i64(raw, &[Key("sys"), Key("sunset")]).and_then(epoch_to_utc),
        units,
    };

    record.validated()
}

fn epoch_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> Value {
        json!({
            "dt": 1_704_628_800,
            "timezone": 3600,
            "weather": [{"main": "Clouds", "description": "scattered clouds"}],
            "main": {
                "temp": 11.3,
                "feels_like": 10.1,
                "temp_min": 8.9,
                "temp_max": 13.0,
                "humidity": 77,
                "pressure": 1021
            },
            "clouds": {"all": 40},
            "wind": {"speed": 4.6, "deg": 250},
            "sys": {"sunrise": 1_704_612_000, "sunset": 1_704_645_600}
        })
    }

    #[test]
    fn maps_every_field_from_a_full_payload() {
        let record =
            normalize("Lisbon", "pt", &full_payload(), UnitSystem::Metric).expect("valid record");

        assert_eq!(record.city.as_deref(), Some("Lisbon"));
        assert_eq!(record.country.as_deref(), Some("PT"));
        assert_eq!(
            record.timestamp,
            DateTime::from_timestamp(1_704_628_800, 0)
        );
        assert_eq!(record.timezone_offset, Some(3600));
        assert_eq!(record.weather.as_deref(), Some("Clouds"));
        assert_eq!(
            record.weather_description.as_deref(),
            Some("scattered clouds")
        );
        assert_eq!(record.temperature_current, Some(11.3));
        assert_eq!(record.temperature_feels_like, Some(10.1));
        assert_eq!(record.temperature_min, Some(8.9));
        assert_eq!(record.temperature_max, Some(13.0));
        assert_eq!(record.humidity, Some(77));
        assert_eq!(record.pressure, Some(1021));
        assert_eq!(record.cloudiness, Some(40));
        assert_eq!(record.wind_speed, Some(4.6));
        assert_eq!(record.wind_direction_deg, Some(250.0));
        assert_eq!(record.sunrise, DateTime::from_timestamp(1_704_612_000, 0));
        assert_eq!(record.sunset, DateTime::from_timestamp(1_704_645_600, 0));
        assert_eq!(record.units, UnitSystem::Metric);
    }

    #[test]
    fn missing_sections_become_none_without_failing() {
        let record = normalize("Porto", "PT", &json!({"dt": 1_704_628_800}), UnitSystem::Metric)
            .expect("sparse record is still valid");

        assert!(record.timestamp.is_some());
        assert_eq!(record.weather, None);
        assert_eq!(record.temperature_current, None);
        assert_eq!(record.wind_speed, None);
        assert_eq!(record.wind_direction_deg, None);
        assert_eq!(record.sunrise, None);
    }

    #[test]
    fn empty_payload_yields_only_identity_fields() {
        let record =
            normalize("Faro", "PT", &json!({}), UnitSystem::Imperial).expect("valid record");

        assert_eq!(record.city.as_deref(), Some("Faro"));
        assert_eq!(record.country.as_deref(), Some("PT"));
        assert_eq!(record.timestamp, None);
        assert_eq!(record.units, UnitSystem::Imperial);
    }

    #[test]
    fn mistyped_fields_are_treated_as_missing() {
        let raw = json!({
            "dt": "not-a-number",
            "weather": {"main": "Rain"},
            "main": {"temp": "warm"}
        });

        let record = normalize("Braga", "PT", &raw, UnitSystem::Metric).expect("valid record");
        assert_eq!(record.timestamp, None);
        assert_eq!(record.weather, None);
        assert_eq!(record.temperature_current, None);
    }

    #[test]
    fn wind_bearing_wraps_into_range() {
        let record = |deg: f64| {
            normalize(
                "Lisbon",
                "PT",
                &json!({"wind": {"deg": deg}}),
                UnitSystem::Metric,
            )
            .expect("wrapped bearing is valid")
        };

        assert_eq!(record(360.0).wind_direction_deg, Some(0.0));
        assert_eq!(record(370.0).wind_direction_deg, Some(10.0));
        assert_eq!(record(-90.0).wind_direction_deg, Some(270.0));
    }
}
