//! Dataset Module - Reading model, bulk load and export
//!
//! Readings are owned by the caller; this module only creates, parses and
//! writes them.

pub mod record;
pub mod loader;
pub mod export;


pub use record::{AnomalyLabel, DoorStatus, Reading};
pub use loader::{load_readings, read_readings, LoadError};
pub use export::ExportError;

/// Index of the first reading whose timestamp goes backwards, if any
pub fn first_out_of_order(readings: &[Reading]) -> Option<usize> {
    readings
        .windows(2)
        .position(|w| w[1].timestamp < w[0].timestamp)
        .map(|i| i + 1)
}
