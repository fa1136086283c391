//! Detection Pipeline - encoder + scorer under the minimum-sample policy
//!
//! ## Flow
//! 1. Validate config
//! 2. Encode the whole batch (malformed readings fail here in either state)
//! 3. `len <= min_samples_for_model` → Bootstrapping: all Normal, model untouched
//! 4. Otherwise → Scoring: fit + score once on the encoded batch
//!
//! The pipeline keeps no state between calls. Callers that evaluate the
//! same growing batch from several threads must serialize those calls.

use ndarray::Array2;
use thiserror::Error;

use super::config::{ConfigError, PipelineConfig};
use super::result::{BatchSnapshot, EvaluationResult, PipelineState};
use crate::logic::dataset::{first_out_of_order, AnomalyLabel, Reading};
use crate::logic::features::{encode, EncodingError, FeatureSummary};
use crate::logic::model::{AnomalyScorer, IsolationForestScorer, ScoringError};

/// Score assigned to readings that were never scored
pub const BOOTSTRAP_SCORE: f64 = 0.0;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline<S: AnomalyScorer = IsolationForestScorer> {
    scorer: S,
}

impl<S: AnomalyScorer> DetectionPipeline<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Label every reading in `readings`. Returns new copies; the input is
    /// never modified. Any error aborts the whole call.
    pub fn evaluate(
        &self,
        readings: &[Reading],
        config: &PipelineConfig,
    ) -> Result<EvaluationResult, PipelineError> {
        config.validate()?;

        if let Some(row) = first_out_of_order(readings) {
            log::warn!("Reading {} is timestamped before its predecessor", row);
        }

        let matrix = encode(readings, config.feature_set)?;

        match config.state_for(readings.len()) {
            PipelineState::Bootstrapping => Ok(self.bootstrap(readings, &matrix, config)),
            PipelineState::Scoring => self.score(readings, &matrix, config),
        }
    }

    fn bootstrap(
        &self,
        readings: &[Reading],
        matrix: &Array2<f64>,
        config: &PipelineConfig,
    ) -> EvaluationResult {
        log::debug!(
            "Bootstrapping: {} readings <= {} required, model not fitted",
            readings.len(),
            config.min_samples_for_model
        );

        let labeled_readings = readings
            .iter()
            .map(|r| r.labeled(AnomalyLabel::Normal, BOOTSTRAP_SCORE))
            .collect();

        EvaluationResult {
            labeled_readings,
            total_count: readings.len(),
            anomaly_count: 0,
            state: PipelineState::Bootstrapping,
            feature_set: config.feature_set,
            snapshot: None,
            feature_summary: Some(FeatureSummary::from_matrix(matrix, config.feature_set)),
        }
    }

    fn score(
        &self,
        readings: &[Reading],
        matrix: &Array2<f64>,
        config: &PipelineConfig,
    ) -> Result<EvaluationResult, PipelineError> {
        let batch = self
            .scorer
            .fit_and_score(matrix, config.contamination, config.seed)?;

        if batch.labels.len() != readings.len() || batch.scores.len() != readings.len() {
            return Err(ScoringError::RowCountMismatch {
                expected: readings.len(),
                actual: batch.labels.len().min(batch.scores.len()),
            }
            .into());
        }

        let labeled_readings: Vec<Reading> = readings
            .iter()
            .zip(batch.labels.iter().zip(batch.scores.iter()))
            .map(|(r, (label, score))| r.labeled(*label, *score))
            .collect();
        let anomaly_count = batch.anomaly_count();

        log::info!(
            "Scored {} readings with {} ({}): {} anomalies",
            readings.len(),
            self.scorer.name(),
            config.feature_set,
            anomaly_count
        );

        Ok(EvaluationResult {
            labeled_readings,
            total_count: readings.len(),
            anomaly_count,
            state: PipelineState::Scoring,
            feature_set: config.feature_set,
            snapshot: Some(BatchSnapshot::of(matrix, config.feature_set)),
            feature_summary: Some(FeatureSummary::from_matrix(matrix, config.feature_set)),
        })
    }
}

/// Evaluate with the default isolation forest scorer
pub fn evaluate(
    readings: &[Reading],
    config: &PipelineConfig,
) -> Result<EvaluationResult, PipelineError> {
    DetectionPipeline::<IsolationForestScorer>::default().evaluate(readings, config)
}
