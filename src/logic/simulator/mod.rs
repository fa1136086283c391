//! Simulator Module - synthetic cold-chain readings
//!
//! Dùng cho demo và test. Produces readings shaped exactly like ingested ones.

pub mod generator;

pub use generator::SensorSimulator;
