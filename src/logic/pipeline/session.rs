//! Live Session - caller-side accumulator
//!
//! Holds the growing reading set for a live view and re-runs the pipeline on
//! the whole set after each push. The pipeline itself stays stateless; this
//! type is just the collaborator's bookkeeping.

use super::config::{ConfigError, PipelineConfig};
use super::engine::{DetectionPipeline, PipelineError};
use super::result::EvaluationResult;
use crate::logic::dataset::Reading;
use crate::logic::model::{AnomalyScorer, IsolationForestScorer};

#[derive(Debug)]
pub struct Session<S: AnomalyScorer = IsolationForestScorer> {
    pipeline: DetectionPipeline<S>,
    config: PipelineConfig,
    readings: Vec<Reading>,
    latest: Option<EvaluationResult>,
}

impl Session<IsolationForestScorer> {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        Self::with_scorer(config, IsolationForestScorer::default())
    }
}

impl<S: AnomalyScorer> Session<S> {
    pub fn with_scorer(config: PipelineConfig, scorer: S) -> Result<Self, ConfigError> {
        config.validate()?;
        for warning in config.warnings() {
            log::warn!("{}", warning);
        }

        Ok(Self {
            pipeline: DetectionPipeline::new(scorer),
            config,
            readings: Vec::new(),
            latest: None,
        })
    }

    /// Seed the session with an initial batch and evaluate once
    pub fn extend(&mut self, batch: Vec<Reading>) -> Result<&EvaluationResult, PipelineError> {
        let before = self.readings.len();
        self.readings.extend(batch);
        self.reevaluate(before)
    }

    /// Append one reading and re-evaluate the whole set.
    /// On error the reading is dropped and the previous result stays current.
    pub fn push(&mut self, reading: Reading) -> Result<&EvaluationResult, PipelineError> {
        let before = self.readings.len();
        self.readings.push(reading);
        self.reevaluate(before)
    }

    fn reevaluate(&mut self, rollback_to: usize) -> Result<&EvaluationResult, PipelineError> {
        match self.pipeline.evaluate(&self.readings, &self.config) {
            Ok(result) => Ok(self.latest.insert(result)),
            Err(e) => {
                self.readings.truncate(rollback_to);
                Err(e)
            }
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn latest(&self) -> Option<&EvaluationResult> {
        self.latest.as_ref()
    }

    pub fn pipeline(&self) -> &DetectionPipeline<S> {
        &self.pipeline
    }
}
