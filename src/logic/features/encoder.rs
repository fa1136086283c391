//! Feature Encoder - Readings → feature matrix
//!
//! Pure mapping from an ordered batch of readings to an `Array2<f64>`.
//! Row `i` of the output always belongs to `readings[i]`.

use ndarray::Array2;
use thiserror::Error;

use super::layout::{Feature, FeatureSet};
use crate::logic::dataset::Reading;

// ============================================================================
// ERRORS
// ============================================================================

/// Malformed or missing required fields in one or more readings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("row {row}: missing door status")]
    MissingDoorStatus { row: usize },

    #[error("row {row}: invalid door status {value:?} (expected \"open\" or \"closed\")")]
    InvalidDoorStatus { row: usize, value: String },

    #[error("row {row}: missing '{field}' required by the {feature_set} feature set")]
    MissingField {
        row: usize,
        field: &'static str,
        feature_set: FeatureSet,
    },

    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode `readings` into a matrix with one column per feature of `feature_set`
pub fn encode(readings: &[Reading], feature_set: FeatureSet) -> Result<Array2<f64>, EncodingError> {
    let layout = feature_set.layout();
    let mut matrix = Array2::<f64>::zeros((readings.len(), layout.len()));

    for (row, reading) in readings.iter().enumerate() {
        for (col, feature) in layout.iter().enumerate() {
            matrix[[row, col]] = encode_value(row, reading, *feature, feature_set)?;
        }
    }

    Ok(matrix)
}

fn encode_value(
    row: usize,
    reading: &Reading,
    feature: Feature,
    feature_set: FeatureSet,
) -> Result<f64, EncodingError> {
    if feature == Feature::DoorStatusEncoded {
        return encode_door(row, reading);
    }

    feature.value(reading).ok_or(EncodingError::MissingField {
        row,
        field: feature.name(),
        feature_set,
    })
}

/// closed → 0, open → 1, anything else is an error
fn encode_door(row: usize, reading: &Reading) -> Result<f64, EncodingError> {
    let raw = match reading.door_status.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Err(EncodingError::MissingDoorStatus { row }),
    };

    reading
        .door()
        .map(|d| d.encoded())
        .ok_or_else(|| EncodingError::InvalidDoorStatus {
            row,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::DoorStatus;
    use chrono::{TimeZone, Utc};

    fn reading(temp: f64, door: DoorStatus) -> Reading {
        Reading::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), temp, 80.0, door)
    }

    #[test]
    fn test_encode_minimal_shape() {
        let readings = vec![reading(4.0, DoorStatus::Closed), reading(5.0, DoorStatus::Open)];
        let matrix = encode(&readings, FeatureSet::Minimal).unwrap();

        assert_eq!(matrix.dim(), (2, 3));
        assert_eq!(matrix[[0, 0]], 4.0);
        assert_eq!(matrix[[0, 2]], 0.0);
        assert_eq!(matrix[[1, 2]], 1.0);
    }

    #[test]
    fn test_encode_empty_batch() {
        let matrix = encode(&[], FeatureSet::Extended).unwrap();
        assert_eq!(matrix.dim(), (0, 5));
    }

    #[test]
    fn test_blank_door_status_is_missing() {
        let mut r = reading(4.0, DoorStatus::Closed);
        r.door_status = Some("  ".to_string());

        let err = encode(&[r], FeatureSet::Minimal).unwrap_err();
        assert_eq!(err, EncodingError::MissingDoorStatus { row: 0 });
    }
}
