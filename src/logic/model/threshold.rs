//! Contamination Threshold
//!
//! Quản lý ngưỡng phát hiện anomaly.
//! The cut-off is data-driven: the `contamination` percentile of the batch's
//! own scores, so roughly that fraction of the batch lands below it.

use serde::{Deserialize, Serialize};

use crate::logic::dataset::AnomalyLabel;

/// Contamination must lie strictly inside (0, 0.5)
pub fn is_valid_contamination(contamination: f64) -> bool {
    contamination.is_finite() && contamination > 0.0 && contamination < 0.5
}

/// Linear-interpolated percentile (`q` in 0..=100) of unsorted values
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Threshold derived from a batch of raw scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContaminationThreshold {
    pub contamination: f64,
    pub offset: f64,
}

impl ContaminationThreshold {
    /// Fit the offset on `scores` (lower = more anomalous)
    pub fn fit(scores: &[f64], contamination: f64) -> Self {
        Self {
            contamination,
            offset: percentile(scores, 100.0 * contamination),
        }
    }

    /// Shift a raw score so that the threshold sits at zero
    pub fn decision(&self, score: f64) -> f64 {
        score - self.offset
    }

    /// Negative decision → Anomaly
    pub fn classify(&self, decision: f64) -> AnomalyLabel {
        if decision < 0.0 {
            AnomalyLabel::Anomaly
        } else {
            AnomalyLabel::Normal
        }
    }
}
