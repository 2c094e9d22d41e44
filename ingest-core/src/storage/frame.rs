//! Arrow-backed encoding of record buckets.
//!
//! A bucket becomes a single `RecordBatch` whose column names carry the
//! display unit labels for the batch's unit system; the batch is then
//! serialized as CSV, line-delimited JSON, or Parquet.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::FileFormat;
use crate::error::StorageError;
use crate::model::{Measure, UnitSystem, WeatherRecord, format_instant};

pub(super) fn write_records(
    path: &Path,
    format: FileFormat,
    records: &[&WeatherRecord],
) -> Result<(), StorageError> {
    let encode_err = |source: ArrowError| StorageError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let parquet_err = |source: parquet::errors::ParquetError| StorageError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let batch = to_record_batch(records).map_err(encode_err)?;
    let file = File::create(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        FileFormat::Csv => {
            let mut writer = arrow::csv::WriterBuilder::new()
                .with_header(true)
                .build(file);
            writer.write(&batch).map_err(encode_err)?;
        }
        FileFormat::JsonLines => {
            let mut writer = arrow::json::WriterBuilder::new()
                .with_explicit_nulls(true)
                .build::<_, arrow::json::writer::LineDelimited>(file);
            writer.write(&batch).map_err(encode_err)?;
            writer.finish().map_err(encode_err)?;
        }
        FileFormat::Parquet => {
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let mut writer =
                ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(parquet_err)?;
            writer.write(&batch).map_err(parquet_err)?;
            writer.close().map_err(parquet_err)?;
        }
    }

    Ok(())
}

/// Output columns, in order. Headers embed the unit labels; values stay
/// numeric.
fn schema(units: UnitSystem) -> Schema {
    Schema::new(vec![
        Field::new("City", DataType::Utf8, true),
        Field::new("Country", DataType::Utf8, true),
        Field::new("Timestamp", DataType::Utf8, true),
        Field::new("Timezone", DataType::Utf8, true),
        Field::new("Weather", DataType::Utf8, true),
        Field::new("Weather_Description", DataType::Utf8, true),
        Field::new("Cloudiness_(%)", DataType::Int64, true),
        Field::new(
            format!(
                "Temperature_Current_({})",
                Measure::TemperatureCurrent.unit_label(units)
            ),
            DataType::Float64,
            true,
        ),
        Field::new(
            format!(
                "Temperature_Min_({})",
                Measure::TemperatureMin.unit_label(units)
            ),
            DataType::Float64,
            true,
        ),
        Field::new(
            format!(
                "Temperature_Max_({})",
                Measure::TemperatureMax.unit_label(units)
            ),
            DataType::Float64,
            true,
        ),
        Field::new(
            format!(
                "Temperature_Feels_Like_({})",
                Measure::TemperatureFeelsLike.unit_label(units)
            ),
            DataType::Float64,
            true,
        ),
        Field::new(
            format!("Wind_Speed_({})", Measure::WindSpeed.unit_label(units)),
            DataType::Float64,
            true,
        ),
        Field::new("Wind_Direction", DataType::Utf8, true),
        Field::new("Humidity_(%)", DataType::Int64, true),
        Field::new("Pressure_(hPa)", DataType::Int64, true),
        Field::new("Sunrise", DataType::Utf8, true),
        Field::new("Sunset", DataType::Utf8, true),
    ])
}

fn string_col<F>(records: &[&WeatherRecord], f: F) -> ArrayRef
where
    F: Fn(&WeatherRecord) -> Option<String>,
{
    Arc::new(StringArray::from(
        records.iter().map(|r| f(r)).collect::<Vec<_>>(),
    ))
}

fn f64_col<F>(records: &[&WeatherRecord], f: F) -> ArrayRef
where
    F: Fn(&WeatherRecord) -> Option<f64>,
{
    Arc::new(Float64Array::from(
        records.iter().map(|r| f(r)).collect::<Vec<_>>(),
    ))
}

fn i64_col<F>(records: &[&WeatherRecord], f: F) -> ArrayRef
where
    F: Fn(&WeatherRecord) -> Option<i64>,
{
    Arc::new(Int64Array::from(
        records.iter().map(|r| f(r)).collect::<Vec<_>>(),
    ))
}

fn to_record_batch(records: &[&WeatherRecord]) -> Result<RecordBatch, ArrowError> {
    let units = records.first().map(|r| r.units).unwrap_or_default();

    let columns: Vec<ArrayRef> = vec![
        string_col(records, |r| r.city.clone()),
        string_col(records, |r| r.country.clone()),
        string_col(records, |r| r.timestamp.map(format_instant)),
        string_col(records, |r| r.timezone_label()),
        string_col(records, |r| r.weather.clone()),
        string_col(records, |r| r.weather_description.clone()),
        i64_col(records, |r| r.cloudiness),
        f64_col(records, |r| r.temperature_current),
        f64_col(records, |r| r.temperature_min),
        f64_col(records, |r| r.temperature_max),
        f64_col(records, |r| r.temperature_feels_like),
        f64_col(records, |r| r.wind_speed),
        string_col(records, |r| r.wind_compass().map(str::to_string)),
        i64_col(records, |r| r.humidity),
        i64_col(records, |r| r.pressure),
        string_col(records, |r| r.sunrise.map(format_instant)),
        string_col(records, |r| r.sunset.map(format_instant)),
    ];

    RecordBatch::try_new(Arc::new(schema(units)), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chrono::DateTime;

    fn sample() -> WeatherRecord {
        WeatherRecord {
            city: Some("Lisbon".to_string()),
            country: Some("PT".to_string()),
            timestamp: DateTime::from_timestamp(1_704_628_800, 0),
            timezone_offset: Some(0),
            weather: Some("Clouds".to_string()),
            temperature_current: Some(11.3),
            wind_speed: Some(4.6),
            wind_direction_deg: Some(250.0),
            humidity: Some(77),
            units: UnitSystem::Metric,
            ..WeatherRecord::default()
        }
    }

    #[test]
    fn batch_has_all_output_columns_in_order() {
        let record = sample();
        let batch = to_record_batch(&[&record]).expect("batch builds");

        assert_eq!(batch.num_columns(), 17);
        assert_eq!(batch.num_rows(), 1);

        let batch_schema = batch.schema();
        let names: Vec<&str> = batch_schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names[0], "City");
        assert_eq!(names[6], "Cloudiness_(%)");
        assert_eq!(names[7], "Temperature_Current_(°C)");
        assert_eq!(names[12], "Wind_Direction");
        assert_eq!(names[16], "Sunset");
    }

    #[test]
    fn headers_follow_the_batch_unit_system() {
        let record = WeatherRecord {
            units: UnitSystem::Imperial,
            ..sample()
        };
        let batch = to_record_batch(&[&record]).expect("batch builds");
        let schema = batch.schema();

        assert!(schema.field_with_name("Temperature_Current_(°F)").is_ok());
        assert!(schema.field_with_name("Wind_Speed_(mph)").is_ok());
    }

    #[test]
    fn gaps_become_nulls() {
        let record = WeatherRecord {
            weather: None,
            pressure: None,
            ..sample()
        };
        let batch = to_record_batch(&[&record]).expect("batch builds");

        assert!(batch.column(4).is_null(0)); // Weather
        assert!(batch.column(14).is_null(0)); // Pressure_(hPa)
        assert!(!batch.column(0).is_null(0)); // City
    }
}
