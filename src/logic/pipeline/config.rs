//! Pipeline Configuration
//!
//! The only knobs of the core: feature set, contamination, the minimum
//! sample threshold and the optional seed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::result::PipelineState;
use crate::constants::{
    FULL_DATASET_CONTAMINATION, FULL_DATASET_MIN_SAMPLES, FULL_DATASET_SEED, LIVE_CONTAMINATION,
    LIVE_MIN_SAMPLES,
};
use crate::logic::features::FeatureSet;
use crate::logic::model::threshold::is_valid_contamination;
use crate::logic::model::MIN_FIT_ROWS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("contamination must be in (0, 0.5), got {0}")]
    InvalidContamination(f64),

    #[error("min_samples_for_model must be at least {required}, got {min_samples}")]
    MinSamplesTooSmall { min_samples: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Columns fed to the model
    pub feature_set: FeatureSet,

    /// Expected fraction of outliers per batch
    pub contamination: f64,

    /// Batches of this size or smaller are not scored
    pub min_samples_for_model: usize,

    /// Fixed seed for reproducible labels; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::live()
    }
}

impl PipelineConfig {
    /// Whole historical dataset: extended features, seeded
    pub fn full_dataset() -> Self {
        Self {
            feature_set: FeatureSet::Extended,
            contamination: FULL_DATASET_CONTAMINATION,
            min_samples_for_model: FULL_DATASET_MIN_SAMPLES,
            seed: Some(FULL_DATASET_SEED),
        }
    }

    /// Readings still arriving: minimal features, unseeded
    pub fn live() -> Self {
        Self {
            feature_set: FeatureSet::Minimal,
            contamination: LIVE_CONTAMINATION,
            min_samples_for_model: LIVE_MIN_SAMPLES,
            seed: None,
        }
    }

    pub fn with_feature_set(mut self, feature_set: FeatureSet) -> Self {
        self.feature_set = feature_set;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples_for_model = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_contamination(self.contamination) {
            return Err(ConfigError::InvalidContamination(self.contamination));
        }

        if self.min_samples_for_model < MIN_FIT_ROWS {
            return Err(ConfigError::MinSamplesTooSmall {
                min_samples: self.min_samples_for_model,
                required: MIN_FIT_ROWS,
            });
        }

        Ok(())
    }

    /// State for a batch of `len` readings. Recomputed on every call.
    pub fn state_for(&self, len: usize) -> PipelineState {
        if len <= self.min_samples_for_model {
            PipelineState::Bootstrapping
        } else {
            PipelineState::Scoring
        }
    }

    /// contamination × size of the first scored batch
    pub fn expected_anomalies_at_threshold(&self) -> f64 {
        self.contamination * (self.min_samples_for_model + 1) as f64
    }

    /// Non-fatal configuration smells
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.expected_anomalies_at_threshold() < 1.0 {
            warnings.push(format!(
                "contamination {} expects {:.2} anomalies in the first scored batch of {}; \
                 early batches will flag at most the single most isolated reading",
                self.contamination,
                self.expected_anomalies_at_threshold(),
                self.min_samples_for_model + 1
            ));
        }

        warnings
    }
}
