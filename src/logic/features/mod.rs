//! Features Module - Feature Encoding Engine
//!
//! Tách logic encode features khỏi pipeline.
//! Layout (columns, version, hash) lives in `layout.rs`.

pub mod layout;
pub mod encoder;
pub mod summary;

#[cfg(test)]
mod tests;

// Re-export common types
pub use encoder::{encode, EncodingError};
pub use layout::{Feature, FeatureSet, LayoutInfo, FEATURE_VERSION};
pub use summary::{ColumnSummary, FeatureSummary};
