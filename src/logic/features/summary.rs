//! Feature Summary - per-column statistics for a batch
//!
//! Attached to scored results and used when reporting a failed batch.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::layout::FeatureSet;
use crate::logic::dataset::Reading;

/// Min/mean/max of one feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn from_values(name: &str, values: impl Iterator<Item = Option<f64>>) -> Self {
        let mut count = 0usize;
        let mut missing = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            match value {
                Some(v) => {
                    count += 1;
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
                None => missing += 1,
            }
        }

        if count == 0 {
            min = 0.0;
            max = 0.0;
        }

        Self {
            name: name.to_string(),
            count,
            missing,
            min,
            mean: if count > 0 { sum / count as f64 } else { 0.0 },
            max,
        }
    }
}

/// Per-column statistics of a batch under one feature set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub feature_set: FeatureSet,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl FeatureSummary {
    /// Summarize an encoded matrix (columns follow the feature set layout)
    pub fn from_matrix(matrix: &Array2<f64>, feature_set: FeatureSet) -> Self {
        let columns = feature_set
            .layout()
            .iter()
            .enumerate()
            .map(|(col, feature)| {
                let values = matrix.column(col).into_iter().map(|v| Some(*v));
                ColumnSummary::from_values(feature.name(), values)
            })
            .collect();

        Self {
            feature_set,
            rows: matrix.nrows(),
            columns,
        }
    }

    /// Best-effort summary of raw readings; unusable values count as missing
    pub fn from_readings(readings: &[Reading], feature_set: FeatureSet) -> Self {
        let columns = feature_set
            .layout()
            .iter()
            .map(|feature| {
                let values = readings.iter().map(|r| feature.value(r));
                ColumnSummary::from_values(feature.name(), values)
            })
            .collect();

        Self {
            feature_set,
            rows: readings.len(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for FeatureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows ({})", self.rows, self.feature_set)?;
        for c in &self.columns {
            write!(
                f,
                "; {}: min={:.2} mean={:.2} max={:.2}",
                c.name, c.min, c.mean, c.max
            )?;
            if c.missing > 0 {
                write!(f, " missing={}", c.missing)?;
            }
        }
        Ok(())
    }
}
