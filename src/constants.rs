//! Central Configuration Constants
//!
//! Single source of truth for all pipeline defaults.
//! Environment overrides are only read by the runner binary, never by the
//! pipeline itself.

use crate::logic::features::FeatureSet;

/// Contamination used for a full historical dataset
pub const FULL_DATASET_CONTAMINATION: f64 = 0.05;

/// Contamination used while readings are still arriving
pub const LIVE_CONTAMINATION: f64 = 0.10;

/// Minimum sample threshold for the full dataset (just enough rows to fit)
pub const FULL_DATASET_MIN_SAMPLES: usize = 2;

/// Minimum sample threshold for the live view
pub const LIVE_MIN_SAMPLES: usize = 5;

/// Seed used by the full dataset view
pub const FULL_DATASET_SEED: u64 = 42;

/// Number of trees in the isolation forest
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Upper bound on rows drawn per tree
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "ColdChain Monitor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get contamination from environment or use default
pub fn get_contamination(default: f64) -> f64 {
    std::env::var("COLDCHAIN_CONTAMINATION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get minimum sample threshold from environment or use default
pub fn get_min_samples(default: usize) -> usize {
    std::env::var("COLDCHAIN_MIN_SAMPLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get feature set from environment or use default
pub fn get_feature_set(default: FeatureSet) -> FeatureSet {
    std::env::var("COLDCHAIN_FEATURE_SET")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get seed from environment or use default.
/// `COLDCHAIN_SEED=none` disables seeding.
pub fn get_seed(default: Option<u64>) -> Option<u64> {
    match std::env::var("COLDCHAIN_SEED") {
        Ok(s) if s.eq_ignore_ascii_case("none") => None,
        Ok(s) => s.parse().ok().or(default),
        Err(_) => default,
    }
}
