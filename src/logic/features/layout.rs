//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema for both variants**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION

use std::fmt;
use std::str::FromStr;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::dataset::Reading;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when a layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURES
// ============================================================================

/// A single numeric column of the feature matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Temperature,
    Humidity,
    ExternalTemp,
    WindSpeed,
    DoorStatusEncoded,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::ExternalTemp => "external_temp",
            Feature::WindSpeed => "wind_speed",
            Feature::DoorStatusEncoded => "door_status_encoded",
        }
    }

    /// CSV column the feature is read from
    pub fn source_column(&self) -> &'static str {
        match self {
            Feature::DoorStatusEncoded => "door_status",
            other => other.name(),
        }
    }

    /// Raw value for this feature, `None` when absent or unparseable
    pub fn value(&self, reading: &Reading) -> Option<f64> {
        match self {
            Feature::Temperature => Some(reading.temperature),
            Feature::Humidity => Some(reading.humidity),
            Feature::ExternalTemp => reading.external_temp,
            Feature::WindSpeed => reading.wind_speed,
            Feature::DoorStatusEncoded => reading.door().map(|d| d.encoded()),
        }
    }
}

// ============================================================================
// FEATURE LAYOUTS (Authoritative source)
// ============================================================================

/// Live view: internal sensors only
pub const MINIMAL_LAYOUT: &[Feature] = &[
    Feature::Temperature,       // 0
    Feature::Humidity,          // 1
    Feature::DoorStatusEncoded, // 2
];

/// Full dataset: internal sensors plus weather context
pub const EXTENDED_LAYOUT: &[Feature] = &[
    Feature::Temperature,       // 0
    Feature::Humidity,          // 1
    Feature::ExternalTemp,      // 2
    Feature::WindSpeed,         // 3
    Feature::DoorStatusEncoded, // 4
];

/// Columns every bulk-load source must carry besides the features
pub const BASE_COLUMNS: &[&str] = &["timestamp"];

// ============================================================================
// FEATURE SET
// ============================================================================

/// Which columns participate in the feature matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    Minimal,
    Extended,
}

impl FeatureSet {
    pub fn layout(&self) -> &'static [Feature] {
        match self {
            FeatureSet::Minimal => MINIMAL_LAYOUT,
            FeatureSet::Extended => EXTENDED_LAYOUT,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.layout().len()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.layout().iter().map(|f| f.name()).collect()
    }

    /// Get feature index by name
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.layout().iter().position(|f| f.name() == name)
    }

    /// Columns a bulk-load source needs for this feature set
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = BASE_COLUMNS.to_vec();
        columns.extend(self.layout().iter().map(|f| f.source_column()));
        columns
    }

    /// CRC32 of version + ordered feature names
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[FEATURE_VERSION]);
        for feature in self.layout() {
            hasher.update(feature.name().as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSet::Minimal => "minimal",
            FeatureSet::Extended => "extended",
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" | "live" => Ok(FeatureSet::Minimal),
            "extended" | "full" => Ok(FeatureSet::Extended),
            other => Err(format!("unknown feature set: {}", other)),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub feature_set: FeatureSet,
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn of(feature_set: FeatureSet) -> Self {
        Self {
            feature_set,
            version: FEATURE_VERSION,
            hash: feature_set.layout_hash(),
            feature_count: feature_set.feature_count(),
            feature_names: feature_set.feature_names().into_iter().map(String::from).collect(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
