//! Logic Module - Detection Engines
//!
//! Chứa các engines xử lý: Dataset, Features, Model, Pipeline, Simulator.
//!
//! ## Flow
//! readings → `features/` (encode) → `model/` (fit + score) → `pipeline/` (labels)

pub mod dataset;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod simulator;
