//! Anomaly Scorer - batch fit + score
//!
//! Every call fits a brand-new model on the supplied matrix; nothing is
//! retained between calls.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::forest::{ForestParams, IsolationForest};
use super::threshold::{is_valid_contamination, ContaminationThreshold};
use crate::logic::dataset::AnomalyLabel;

/// Fewest rows the model can be fitted on
pub const MIN_FIT_ROWS: usize = 2;

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Degenerate input to the model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("need at least {required} rows to fit the model, got {rows}")]
    TooFewRows { rows: usize, required: usize },

    #[error("feature matrix has no columns")]
    NoFeatures,

    #[error("non-finite value {value} at row {row}, column {column}")]
    NonFinite { row: usize, column: usize, value: f64 },

    #[error("contamination must be in (0, 0.5), got {0}")]
    InvalidContamination(f64),

    #[error("scorer returned {actual} labels for {expected} rows")]
    RowCountMismatch { expected: usize, actual: usize },
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Labels and decision scores, one per input row, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBatch {
    pub labels: Vec<AnomalyLabel>,
    /// Decision scores: negative means below the contamination cut-off
    pub scores: Vec<f64>,
    pub threshold: ContaminationThreshold,
}

impl ScoreBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }
}

// ============================================================================
// SCORER TRAIT
// ============================================================================

/// Trait cho scoring engines (isolation forest, test doubles, ...)
pub trait AnomalyScorer {
    /// Fit on the whole matrix and label every row.
    /// A fixed `seed` must make repeated calls on identical input identical.
    fn fit_and_score(
        &self,
        features: &Array2<f64>,
        contamination: f64,
        seed: Option<u64>,
    ) -> Result<ScoreBatch, ScoringError>;

    fn name(&self) -> &str;
}

/// Shared input checks for scorer implementations
pub fn validate_input(features: &Array2<f64>, contamination: f64) -> Result<(), ScoringError> {
    if !is_valid_contamination(contamination) {
        return Err(ScoringError::InvalidContamination(contamination));
    }

    if features.nrows() < MIN_FIT_ROWS {
        return Err(ScoringError::TooFewRows {
            rows: features.nrows(),
            required: MIN_FIT_ROWS,
        });
    }

    if features.ncols() == 0 {
        return Err(ScoringError::NoFeatures);
    }

    if let Some(((row, column), value)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ScoringError::NonFinite { row, column, value: *value });
    }

    Ok(())
}

// ============================================================================
// ISOLATION FOREST IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct IsolationForestScorer {
    params: ForestParams,
}

impl IsolationForestScorer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }
}

impl AnomalyScorer for IsolationForestScorer {
    fn fit_and_score(
        &self,
        features: &Array2<f64>,
        contamination: f64,
        seed: Option<u64>,
    ) -> Result<ScoreBatch, ScoringError> {
        validate_input(features, contamination)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let forest = IsolationForest::fit(features, self.params, &mut rng);
        let raw = forest.score_samples(features);
        let threshold = ContaminationThreshold::fit(&raw, contamination);

        let scores: Vec<f64> = raw.iter().map(|s| threshold.decision(*s)).collect();
        let labels = scores.iter().map(|d| threshold.classify(*d)).collect();

        log::debug!(
            "Isolation forest: {} trees, subsample {}, offset {:.4}",
            forest.n_trees(),
            forest.subsample_size(),
            threshold.offset
        );

        Ok(ScoreBatch { labels, scores, threshold })
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }
}
