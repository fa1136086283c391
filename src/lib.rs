//! ColdChain Core - Anomaly Detection Library
//!
//! Flags cold-chain sensor readings that are outliers relative to the rest
//! of the batch (temperature excursions, door-open events).
//!
//! ## Layout
//! - `logic::dataset` - Reading model, CSV bulk load, export
//! - `logic::features` - Feature layouts and the feature encoder
//! - `logic::model` - Isolation forest scorer
//! - `logic::pipeline` - Bootstrapping/Scoring policy, `evaluate()`
//! - `logic::simulator` - Synthetic reading generator

pub mod constants;
pub mod logic;

pub use logic::dataset::{AnomalyLabel, DoorStatus, Reading};
pub use logic::features::{encode, EncodingError, FeatureSet};
pub use logic::model::{AnomalyScorer, IsolationForestScorer, ScoreBatch, ScoringError};
pub use logic::pipeline::{
    evaluate, ConfigError, DetectionPipeline, EvaluationResult, PipelineConfig, PipelineError,
    PipelineState, Session,
};
