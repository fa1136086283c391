use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DOOR STATUS
// ============================================================================

/// Door state of the refrigerated unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Closed,
    Open,
}

impl DoorStatus {
    /// Parse a raw status ("open" / "closed", case-insensitive, trimmed)
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("closed") {
            Some(DoorStatus::Closed)
        } else if raw.eq_ignore_ascii_case("open") {
            Some(DoorStatus::Open)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoorStatus::Closed => "closed",
            DoorStatus::Open => "open",
        }
    }

    /// Numeric encoding used in feature rows: closed = 0, open = 1
    pub fn encoded(&self) -> f64 {
        match self {
            DoorStatus::Closed => 0.0,
            DoorStatus::Open => 1.0,
        }
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown door status: {:?}", s))
    }
}

// ============================================================================
// ANOMALY LABEL
// ============================================================================

/// Label assigned by the detection pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyLabel {
    Normal,
    Anomaly,
}

impl AnomalyLabel {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, AnomalyLabel::Anomaly)
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyLabel::Normal => f.write_str("Normal"),
            AnomalyLabel::Anomaly => f.write_str("Anomaly"),
        }
    }
}

// ============================================================================
// READING
// ============================================================================

/// One timestamped sensor observation from a shipment.
///
/// `door_status` keeps the raw value as ingested so malformed input is
/// rejected by the encoder instead of being coerced at the edge.
/// `anomaly_label` / `anomaly_score` are derived and only meaningful for the
/// batch that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,

    // Internal sensors
    pub temperature: f64,
    pub humidity: f64,
    pub door_status: Option<String>,

    // Weather context (full dataset only)
    pub external_temp: Option<f64>,
    pub wind_speed: Option<f64>,

    // Route (full dataset only)
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,

    // Derived
    pub anomaly_label: Option<AnomalyLabel>,
    pub anomaly_score: Option<f64>,
}

impl Reading {
    pub fn new(
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        door: DoorStatus,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            door_status: Some(door.as_str().to_string()),
            external_temp: None,
            wind_speed: None,
            gps_lat: None,
            gps_lon: None,
            anomaly_label: None,
            anomaly_score: None,
        }
    }

    /// Attach weather context
    pub fn with_weather(mut self, external_temp: f64, wind_speed: f64) -> Self {
        self.external_temp = Some(external_temp);
        self.wind_speed = Some(wind_speed);
        self
    }

    /// Attach GPS position
    pub fn with_gps(mut self, lat: f64, lon: f64) -> Self {
        self.gps_lat = Some(lat);
        self.gps_lon = Some(lon);
        self
    }

    /// Parsed door status, `None` if absent or unrecognised
    pub fn door(&self) -> Option<DoorStatus> {
        self.door_status.as_deref().and_then(DoorStatus::parse)
    }

    /// Copy of this reading carrying a fresh label
    pub fn labeled(&self, label: AnomalyLabel, score: f64) -> Self {
        Self {
            anomaly_label: Some(label),
            anomaly_score: Some(score),
            ..self.clone()
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.anomaly_label.map_or(false, |l| l.is_anomaly())
    }
}
