//! Integration Tests for Feature Encoding
//!
//! Kiểm tra encoder + layout + summary hoạt động đúng khi kết hợp với nhau.

#[cfg(test)]
mod integration_tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::logic::dataset::{DoorStatus, Reading};
    use crate::logic::features::{encode, EncodingError, FeatureSet, FeatureSummary};

    fn batch() -> Vec<Reading> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        (0..6)
            .map(|i| {
                let door = if i == 3 { DoorStatus::Open } else { DoorStatus::Closed };
                let ts = start + Duration::minutes(i);
                Reading::new(ts, 4.0 + i as f64 * 0.1, 80.0 + i as f64, door)
                    .with_weather(20.0 + i as f64, 3.0)
                    .with_gps(10.77, 106.70)
            })
            .collect()
    }

    #[test]
    fn test_encode_is_idempotent() {
        let readings = batch();
        let first = encode(&readings, FeatureSet::Extended).unwrap();
        let second = encode(&readings, FeatureSet::Extended).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_does_not_touch_input() {
        let readings = batch();
        let before = readings.clone();
        let _ = encode(&readings, FeatureSet::Minimal).unwrap();
        assert_eq!(readings, before);
    }

    #[test]
    fn test_row_order_matches_input() {
        let readings = batch();
        let matrix = encode(&readings, FeatureSet::Extended).unwrap();

        for (i, r) in readings.iter().enumerate() {
            assert_eq!(matrix[[i, 0]], r.temperature);
            assert_eq!(matrix[[i, 1]], r.humidity);
            assert_eq!(matrix[[i, 2]], r.external_temp.unwrap());
        }
        assert_eq!(matrix[[3, 4]], 1.0, "door open → 1");
    }

    #[test]
    fn test_extended_excludes_identifiers() {
        let matrix = encode(&batch(), FeatureSet::Extended).unwrap();
        // timestamp, gps and labels never reach the matrix
        assert_eq!(matrix.ncols(), 5);
    }

    #[test]
    fn test_invalid_door_status_fails() {
        let mut readings = batch();
        readings[2].door_status = Some("ajar".to_string());

        let err = encode(&readings, FeatureSet::Minimal).unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidDoorStatus { row: 2, value: "ajar".to_string() }
        );
    }

    #[test]
    fn test_missing_door_status_fails() {
        let mut readings = batch();
        readings[0].door_status = None;

        let err = encode(&readings, FeatureSet::Minimal).unwrap_err();
        assert_eq!(err, EncodingError::MissingDoorStatus { row: 0 });
    }

    #[test]
    fn test_extended_requires_weather() {
        let mut readings = batch();
        readings[4].wind_speed = None;

        // Minimal ignores weather columns
        assert!(encode(&readings, FeatureSet::Minimal).is_ok());

        match encode(&readings, FeatureSet::Extended) {
            Err(EncodingError::MissingField { row, field, feature_set }) => {
                assert_eq!(row, 4);
                assert_eq!(field, "wind_speed");
                assert_eq!(feature_set, FeatureSet::Extended);
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_door_status_case_insensitive() {
        let mut readings = batch();
        readings[0].door_status = Some(" OPEN ".to_string());

        let matrix = encode(&readings, FeatureSet::Minimal).unwrap();
        assert_eq!(matrix[[0, 2]], 1.0);
    }

    #[test]
    fn test_summary_from_matrix() {
        let readings = batch();
        let matrix = encode(&readings, FeatureSet::Minimal).unwrap();
        let summary = FeatureSummary::from_matrix(&matrix, FeatureSet::Minimal);

        assert_eq!(summary.rows, 6);
        let temp = summary.column("temperature").unwrap();
        assert_eq!(temp.min, 4.0);
        assert!((temp.max - 4.5).abs() < 1e-9);
        assert_eq!(temp.missing, 0);
    }

    #[test]
    fn test_summary_from_readings_counts_missing() {
        let mut readings = batch();
        readings[1].door_status = Some("ajar".to_string());
        readings[2].external_temp = None;

        let summary = FeatureSummary::from_readings(&readings, FeatureSet::Extended);
        assert_eq!(summary.column("door_status_encoded").unwrap().missing, 1);
        assert_eq!(summary.column("external_temp").unwrap().missing, 1);
        assert!(summary.to_string().starts_with("6 rows (extended)"));
    }
}
