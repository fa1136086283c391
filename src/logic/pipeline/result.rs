use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::dataset::Reading;
use crate::logic::features::{FeatureSet, FeatureSummary};

/// Pipeline state for one call, derived from batch size alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// Too few readings to fit a meaningful model; everything is Normal
    Bootstrapping,
    /// Model fitted on and applied to the whole batch
    Scoring,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Bootstrapping => f.write_str("bootstrapping"),
            PipelineState::Scoring => f.write_str("scoring"),
        }
    }
}

/// Identifies the exact batch a set of labels was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub size: usize,
    pub feature_set: FeatureSet,
    pub layout_hash: u32,
    /// SHA-256 of the encoded feature matrix
    pub fingerprint: String,
}

impl BatchSnapshot {
    pub fn of(matrix: &Array2<f64>, feature_set: FeatureSet) -> Self {
        let layout_hash = feature_set.layout_hash();

        let mut hasher = Sha256::new();
        hasher.update(layout_hash.to_le_bytes());
        hasher.update((matrix.nrows() as u64).to_le_bytes());
        for value in matrix.iter() {
            hasher.update(value.to_le_bytes());
        }

        Self {
            size: matrix.nrows(),
            feature_set,
            layout_hash,
            fingerprint: hex::encode(hasher.finalize()),
        }
    }
}

/// Output of one `evaluate()` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Labeled copies of the input, same order
    pub labeled_readings: Vec<Reading>,
    pub total_count: usize,
    pub anomaly_count: usize,
    pub state: PipelineState,
    pub feature_set: FeatureSet,

    /// Present only when the model ran
    pub snapshot: Option<BatchSnapshot>,
    /// Per-column stats of the encoded batch (empty batches included)
    pub feature_summary: Option<FeatureSummary>,
}

impl EvaluationResult {
    pub fn normal_count(&self) -> usize {
        self.total_count - self.anomaly_count
    }

    pub fn anomaly_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.anomaly_count as f64 / self.total_count as f64
        }
    }

    pub fn is_scored(&self) -> bool {
        self.state == PipelineState::Scoring
    }

    /// (position, reading) for every reading labeled Anomaly
    pub fn anomalies(&self) -> impl Iterator<Item = (usize, &Reading)> {
        self.labeled_readings
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_anomaly())
    }
}
