//! Model Module - Outlier Detection Engine
//!
//! Tách logic fit/score khỏi pipeline.
//! Dễ dàng swap model qua trait `AnomalyScorer`.

pub mod forest;
pub mod scorer;
pub mod threshold;

// Re-export common types
pub use forest::{ForestParams, IsolationForest};
pub use scorer::{AnomalyScorer, IsolationForestScorer, ScoreBatch, ScoringError, MIN_FIT_ROWS};
pub use threshold::ContaminationThreshold;
