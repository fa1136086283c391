//! Pipeline Module - Detection orchestration
//!
//! Single entry point `evaluate()`: Bootstrapping fallback for small
//! batches, full refit + score for everything larger.

pub mod config;
pub mod engine;
pub mod result;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export common types
pub use config::{ConfigError, PipelineConfig};
pub use engine::{evaluate, DetectionPipeline, PipelineError, BOOTSTRAP_SCORE};
pub use result::{BatchSnapshot, EvaluationResult, PipelineState};
pub use session::Session;
