//! Bulk Loader - seed a session from a CSV export
//!
//! Schema problems fail fast; nothing is silently defaulted.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use super::record::{DoorStatus, Reading};
use crate::logic::features::{EncodingError, FeatureSet};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Schema(#[from] EncodingError),

    #[error("row {row}: invalid value {value:?} in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: timestamp {timestamp} is earlier than the previous reading")]
    OutOfOrder { row: usize, timestamp: DateTime<Utc> },
}

/// Load readings from a CSV file
pub fn load_readings(path: &Path, feature_set: FeatureSet) -> Result<Vec<Reading>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let readings = read_readings(file, feature_set)?;
    log::info!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Parse readings from any CSV source. Row numbers in errors are zero-based
/// data rows (the header is not counted).
pub fn read_readings<R: Read>(
    source: R,
    feature_set: FeatureSet,
) -> Result<Vec<Reading>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase(), i))
        .collect();

    let missing: Vec<String> = feature_set
        .required_columns()
        .into_iter()
        .filter(|c| !columns.contains_key(*c))
        .map(String::from)
        .collect();

    if !missing.is_empty() {
        return Err(EncodingError::MissingColumns { columns: missing }.into());
    }

    let mut readings = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let cell = |name: &str| {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .filter(|v| !v.is_empty())
        };

        let raw_ts = cell("timestamp").unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidValue {
            row,
            column: "timestamp".to_string(),
            value: raw_ts.to_string(),
        })?;

        if previous.map_or(false, |p| timestamp < p) {
            return Err(LoadError::OutOfOrder { row, timestamp });
        }
        previous = Some(timestamp);

        let door_raw = cell("door_status").ok_or(EncodingError::MissingDoorStatus { row })?;
        if DoorStatus::parse(door_raw).is_none() {
            return Err(EncodingError::InvalidDoorStatus {
                row,
                value: door_raw.to_string(),
            }
            .into());
        }

        let required = |name: &str| -> Result<f64, LoadError> {
            let raw = cell(name).unwrap_or_default();
            parse_number(row, name, raw)
        };
        let optional = |name: &str| -> Result<Option<f64>, LoadError> {
            cell(name).map(|raw| parse_number(row, name, raw)).transpose()
        };

        let reading = Reading {
            timestamp,
            temperature: required("temperature")?,
            humidity: required("humidity")?,
            door_status: Some(door_raw.to_string()),
            external_temp: optional("external_temp")?,
            wind_speed: optional("wind_speed")?,
            gps_lat: optional("gps_lat")?,
            gps_lon: optional("gps_lon")?,
            anomaly_label: None,
            anomaly_score: None,
        };

        if feature_set == FeatureSet::Extended {
            if reading.external_temp.is_none() {
                return Err(missing_field(row, "external_temp"));
            }
            if reading.wind_speed.is_none() {
                return Err(missing_field(row, "wind_speed"));
            }
        }

        readings.push(reading);
    }

    Ok(readings)
}

fn missing_field(row: usize, field: &'static str) -> LoadError {
    EncodingError::MissingField {
        row,
        field,
        feature_set: FeatureSet::Extended,
    }
    .into()
}

fn parse_number(row: usize, column: &str, raw: &str) -> Result<f64, LoadError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-06-01T08:00:00Z").is_some());
        assert!(parse_timestamp("2024-06-01 08:00:00").is_some());
        assert!(parse_timestamp("2024-06-01 08:00:00.250").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_number_rejects_nan() {
        assert!(parse_number(0, "temperature", "NaN").is_err());
        assert_eq!(parse_number(0, "temperature", "4.5").unwrap(), 4.5);
    }
}
