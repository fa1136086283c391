//! Integration Tests for the Detection Pipeline
//!
//! Kiểm tra state machine Bootstrapping/Scoring, determinism và error propagation.

use std::cell::Cell;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    evaluate, ConfigError, DetectionPipeline, PipelineConfig, PipelineError, PipelineState,
    Session, BOOTSTRAP_SCORE,
};
use crate::logic::dataset::{AnomalyLabel, DoorStatus, Reading};
use crate::logic::features::{EncodingError, FeatureSet};
use crate::logic::model::{
    AnomalyScorer, IsolationForestScorer, ScoreBatch, ScoringError,
};
use crate::logic::model::threshold::ContaminationThreshold;
use crate::logic::simulator::SensorSimulator;

// ============================================================================
// HELPERS
// ============================================================================

/// Wraps the real scorer and counts invocations
#[derive(Debug, Default)]
struct CountingScorer {
    calls: Cell<usize>,
    inner: IsolationForestScorer,
}

impl AnomalyScorer for CountingScorer {
    fn fit_and_score(
        &self,
        features: &Array2<f64>,
        contamination: f64,
        seed: Option<u64>,
    ) -> Result<ScoreBatch, ScoringError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.fit_and_score(features, contamination, seed)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Returns one label short
#[derive(Debug, Default)]
struct TruncatingScorer;

impl AnomalyScorer for TruncatingScorer {
    fn fit_and_score(
        &self,
        features: &Array2<f64>,
        contamination: f64,
        _seed: Option<u64>,
    ) -> Result<ScoreBatch, ScoringError> {
        let n = features.nrows().saturating_sub(1);
        Ok(ScoreBatch {
            labels: vec![AnomalyLabel::Normal; n],
            scores: vec![0.0; n],
            threshold: ContaminationThreshold { contamination, offset: 0.0 },
        })
    }

    fn name(&self) -> &str {
        "truncating"
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

fn readings_from_temps(temps: &[f64]) -> Vec<Reading> {
    temps
        .iter()
        .enumerate()
        .map(|(i, t)| {
            Reading::new(start() + Duration::minutes(i as i64), *t, 80.0, DoorStatus::Closed)
        })
        .collect()
}

fn steady(n: usize) -> Vec<Reading> {
    let temps: Vec<f64> = (0..n).map(|i| 4.0 + (i % 5) as f64 * 0.05).collect();
    readings_from_temps(&temps)
}

fn live(min_samples: usize) -> PipelineConfig {
    PipelineConfig::live().with_min_samples(min_samples).with_seed(Some(42))
}

// ============================================================================
// BOOTSTRAPPING / SCORING
// ============================================================================

#[test]
fn test_small_batches_all_normal_without_scoring() {
    let pipeline = DetectionPipeline::new(CountingScorer::default());
    let config = live(5);

    for n in 0..=5 {
        let result = pipeline.evaluate(&steady(n), &config).unwrap();

        assert_eq!(result.state, PipelineState::Bootstrapping);
        assert_eq!(result.total_count, n);
        assert_eq!(result.anomaly_count, 0);
        assert!(result.labeled_readings.iter().all(|r| {
            r.anomaly_label == Some(AnomalyLabel::Normal)
                && r.anomaly_score == Some(BOOTSTRAP_SCORE)
        }));
        assert!(result.snapshot.is_none());
    }

    assert_eq!(pipeline.scorer().calls.get(), 0);
}

#[test]
fn test_boundary_at_min_samples() {
    let pipeline = DetectionPipeline::new(CountingScorer::default());
    let config = live(5);

    let at = pipeline.evaluate(&steady(5), &config).unwrap();
    assert_eq!(at.state, PipelineState::Bootstrapping);
    assert_eq!(pipeline.scorer().calls.get(), 0);

    let above = pipeline.evaluate(&steady(6), &config).unwrap();
    assert_eq!(above.state, PipelineState::Scoring);
    assert_eq!(pipeline.scorer().calls.get(), 1);
    assert!(above.snapshot.is_some());
}

#[test]
fn test_no_hysteresis_when_batch_shrinks() {
    let pipeline = DetectionPipeline::new(CountingScorer::default());
    let config = live(5);

    assert!(pipeline.evaluate(&steady(12), &config).unwrap().is_scored());
    let shrunk = pipeline.evaluate(&steady(4), &config).unwrap();

    assert_eq!(shrunk.state, PipelineState::Bootstrapping);
    assert_eq!(pipeline.scorer().calls.get(), 1);
}

#[test]
fn test_every_scoring_call_refits() {
    let pipeline = DetectionPipeline::new(CountingScorer::default());
    let config = live(5);
    let batch = steady(10);

    for _ in 0..3 {
        pipeline.evaluate(&batch, &config).unwrap();
    }
    assert_eq!(pipeline.scorer().calls.get(), 3);
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn test_injected_excursion_flagged() {
    let readings = readings_from_temps(&[4.0, 4.1, 3.9, 4.2, 4.0, 18.5]);
    let config = PipelineConfig::live()
        .with_min_samples(5)
        .with_contamination(0.1)
        .with_seed(Some(42));

    let result = evaluate(&readings, &config).unwrap();

    assert_eq!(result.total_count, 6);
    assert_eq!(result.anomaly_count, 1);
    assert_eq!(result.labeled_readings[5].anomaly_label, Some(AnomalyLabel::Anomaly));

    let flagged: Vec<usize> = result.anomalies().map(|(i, _)| i).collect();
    assert_eq!(flagged, vec![5]);
}

#[test]
fn test_unseeded_live_preset_flags_excursion() {
    let mut readings = steady(30);
    readings.push(Reading::new(start() + Duration::minutes(30), 25.0, 80.0, DoorStatus::Closed));
    let config = PipelineConfig::live();
    assert_eq!(config.seed, None);

    let result = evaluate(&readings, &config).unwrap();

    assert_eq!(result.state, PipelineState::Scoring);
    assert_eq!(result.total_count, 31);
    assert_eq!(result.labeled_readings.len(), readings.len());
    assert_eq!(result.labeled_readings[30].anomaly_label, Some(AnomalyLabel::Anomaly));
}

#[test]
fn test_anomaly_count_tracks_contamination() {
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 100;
    let contamination = 0.1;
    let extreme = (contamination * n as f64).ceil() as usize;

    let mut readings: Vec<Reading> = (0..n - extreme)
        .map(|i| {
            Reading::new(
                start() + Duration::minutes(i as i64),
                4.0 + rng.gen_range(-0.5..0.5),
                80.0 + rng.gen_range(-2.0..2.0),
                DoorStatus::Closed,
            )
        })
        .collect();
    for i in 0..extreme {
        readings.push(Reading::new(
            start() + Duration::minutes((n - extreme + i) as i64),
            17.0 + rng.gen_range(-1.0..1.0),
            55.0 + rng.gen_range(-2.0..2.0),
            DoorStatus::Open,
        ));
    }

    let config = PipelineConfig::live()
        .with_contamination(contamination)
        .with_seed(Some(7));
    let result = evaluate(&readings, &config).unwrap();

    let expected = contamination * n as f64;
    assert!(
        (result.anomaly_count as f64 - expected).abs() <= 2.0,
        "anomaly_count {} too far from {}",
        result.anomaly_count,
        expected
    );

    let extremes_flagged = result.labeled_readings[n - extreme..]
        .iter()
        .filter(|r| r.is_anomaly())
        .count();
    assert!(extremes_flagged >= extreme - 2);
}

#[test]
fn test_full_dataset_preset_on_simulated_route() {
    let mut sim = SensorSimulator::new(42);
    sim.door_open_probability = 0.0;
    let mut readings = sim.generate_batch(60);

    // Door left open during a compressor failure
    sim.door_open_probability = 1.0;
    sim.inject_excursion(12.0);
    readings.extend(sim.generate_batch(3));

    let result = evaluate(&readings, &PipelineConfig::full_dataset()).unwrap();

    assert_eq!(result.feature_set, FeatureSet::Extended);
    assert_eq!(result.total_count, 63);
    assert!(result.labeled_readings[60..].iter().all(|r| r.is_anomaly()));

    let summary = result.feature_summary.as_ref().unwrap();
    assert_eq!(summary.columns.len(), 5);
}

// ============================================================================
// DETERMINISM / ORDER / PURITY
// ============================================================================

#[test]
fn test_seeded_evaluation_is_deterministic() {
    let readings = SensorSimulator::new(5).generate_batch(40);
    let config = PipelineConfig::full_dataset();

    let a = evaluate(&readings, &config).unwrap();
    let b = evaluate(&readings, &config).unwrap();

    assert_eq!(a.labeled_readings, b.labeled_readings);
    assert_eq!(a.snapshot, b.snapshot);
}

#[test]
fn test_output_order_matches_input() {
    let readings = SensorSimulator::new(9).generate_batch(25);
    let result = evaluate(&readings, &PipelineConfig::full_dataset()).unwrap();

    assert_eq!(result.labeled_readings.len(), readings.len());
    for (input, output) in readings.iter().zip(&result.labeled_readings) {
        assert_eq!(input.timestamp, output.timestamp);
        assert_eq!(input.temperature, output.temperature);
        assert!(output.anomaly_label.is_some());
    }
}

#[test]
fn test_input_is_not_mutated() {
    let readings = SensorSimulator::new(9).generate_batch(25);
    let before = readings.clone();

    let _ = evaluate(&readings, &PipelineConfig::full_dataset()).unwrap();
    assert_eq!(readings, before);
}

#[test]
fn test_snapshot_changes_with_batch() {
    let mut readings = steady(10);
    let config = live(5);

    let first = evaluate(&readings, &config).unwrap().snapshot.unwrap();
    readings.push(readings[0].clone());
    let second = evaluate(&readings, &config).unwrap().snapshot.unwrap();

    assert_ne!(first.fingerprint, second.fingerprint);
    assert_eq!(second.size, 11);
    assert_eq!(first.layout_hash, FeatureSet::Minimal.layout_hash());
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_invalid_door_status_fails_closed() {
    let pipeline = DetectionPipeline::new(CountingScorer::default());
    let mut readings = steady(10);
    readings[7].door_status = Some("ajar".to_string());

    let err = pipeline.evaluate(&readings, &live(5)).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Encoding(EncodingError::InvalidDoorStatus {
            row: 7,
            value: "ajar".to_string()
        })
    );
    assert_eq!(pipeline.scorer().calls.get(), 0);
}

#[test]
fn test_invalid_door_status_fails_while_bootstrapping() {
    let mut readings = steady(3);
    readings[0].door_status = Some("ajar".to_string());

    let err = evaluate(&readings, &live(5)).unwrap_err();
    assert!(matches!(err, PipelineError::Encoding(EncodingError::InvalidDoorStatus { .. })));
}

#[test]
fn test_scoring_error_propagates_unchanged() {
    let mut readings = steady(10);
    readings[4].temperature = f64::INFINITY;

    let err = evaluate(&readings, &live(5)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Scoring(ScoringError::NonFinite { row: 4, column: 0, .. })
    ));
    // Same message as the underlying error
    assert!(err.to_string().starts_with("non-finite value"));
}

#[test]
fn test_extreme_finite_values_are_scored() {
    let readings = readings_from_temps(&[-1.0e308, 4.0, 4.1, 3.9, 4.2, 1.0e308, 4.0]);

    let result = evaluate(&readings, &live(5)).unwrap();

    assert_eq!(result.state, PipelineState::Scoring);
    assert_eq!(result.total_count, 7);
    assert!(result.labeled_readings.iter().all(|r| r.anomaly_label.is_some()));
}

#[test]
fn test_invalid_config_rejected() {
    let config = live(5).with_contamination(0.0);
    let err = evaluate(&steady(10), &config).unwrap_err();
    assert_eq!(err, PipelineError::Config(ConfigError::InvalidContamination(0.0)));
}

#[test]
fn test_scorer_row_mismatch_rejected() {
    let pipeline = DetectionPipeline::new(TruncatingScorer);
    let err = pipeline.evaluate(&steady(10), &live(5)).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Scoring(ScoringError::RowCountMismatch { expected: 10, actual: 9 })
    );
}

// ============================================================================
// SESSION
// ============================================================================

#[test]
fn test_session_transitions_on_sixth_reading() {
    let mut session = Session::with_scorer(live(5), CountingScorer::default()).unwrap();

    for (i, reading) in steady(6).into_iter().enumerate() {
        let result = session.push(reading).unwrap();
        assert_eq!(result.total_count, i + 1);
        let expected = if i < 5 { PipelineState::Bootstrapping } else { PipelineState::Scoring };
        assert_eq!(result.state, expected);
    }

    assert_eq!(session.pipeline().scorer().calls.get(), 1);
}

#[test]
fn test_session_drops_rejected_reading() {
    let mut session = Session::new(live(5)).unwrap();
    session.extend(steady(8)).unwrap();

    let mut bad = steady(1).remove(0);
    bad.door_status = None;

    assert!(session.push(bad).is_err());
    assert_eq!(session.len(), 8);
    assert_eq!(session.latest().map(|r| r.total_count), Some(8));
}

#[test]
fn test_session_rejects_invalid_config() {
    let result = Session::new(PipelineConfig::live().with_min_samples(0));
    assert!(matches!(result, Err(ConfigError::MinSamplesTooSmall { .. })));
}
