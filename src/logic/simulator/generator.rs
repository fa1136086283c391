use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::logic::dataset::{DoorStatus, Reading};

/// Temperature rise while the door stands open (°C)
pub const DOOR_OPEN_TEMP_RISE: f64 = 1.5;

/// Humidity drop while the door stands open (%)
pub const DOOR_OPEN_HUMIDITY_DROP: f64 = 6.0;

pub struct SensorSimulator {
    rng: StdRng,
    sequence_counter: u64,
    clock: DateTime<Utc>,
    excursion: f64,
    pub interval: Duration,
    pub base_temp: f64,
    pub temp_noise: f64,
    pub base_humidity: f64,
    pub humidity_noise: f64,
    pub door_open_probability: f64,
    pub base_external_temp: f64,
    pub base_wind_speed: f64,
    pub position: (f64, f64),
    pub heading: (f64, f64),
}

impl SensorSimulator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence_counter: 0,
            clock: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).single().unwrap_or_else(Utc::now),
            excursion: 0.0,
            interval: Duration::minutes(5),
            base_temp: 4.0,
            temp_noise: 0.3,
            base_humidity: 80.0,
            humidity_noise: 2.0,
            door_open_probability: 0.02,
            base_external_temp: 28.0,
            base_wind_speed: 3.0,
            position: (10.7769, 106.7009),
            heading: (0.0004, 0.0006),
        }
    }

    /// Start the clock at `start` instead of the default
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.clock = start;
        self
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }

    /// Next reading, one `interval` after the previous
    pub fn generate(&mut self) -> Reading {
        self.sequence_counter += 1;

        let door = if self.rng.gen_bool(self.door_open_probability.clamp(0.0, 1.0)) {
            DoorStatus::Open
        } else {
            DoorStatus::Closed
        };
        let (temp_rise, humidity_drop) = match door {
            DoorStatus::Open => (DOOR_OPEN_TEMP_RISE, DOOR_OPEN_HUMIDITY_DROP),
            DoorStatus::Closed => (0.0, 0.0),
        };

        let temperature =
            self.base_temp + self.excursion + temp_rise + self.jitter(self.temp_noise);
        let humidity = self.base_humidity - humidity_drop + self.jitter(self.humidity_noise);
        let external_temp = self.base_external_temp + self.jitter(1.5);
        let wind_speed = (self.base_wind_speed + self.jitter(1.0)).max(0.0);

        let reading = Reading::new(self.clock, temperature, humidity, door)
            .with_weather(external_temp, wind_speed)
            .with_gps(self.position.0, self.position.1);

        self.clock += self.interval;
        self.position.0 += self.heading.0;
        self.position.1 += self.heading.1;

        reading
    }

    pub fn generate_batch(&mut self, count: usize) -> Vec<Reading> {
        (0..count).map(|_| self.generate()).collect()
    }

    pub fn get_sequence(&self) -> u64 {
        self.sequence_counter
    }

    /// Shift internal temperature by `delta` until cleared
    pub fn inject_excursion(&mut self, delta: f64) {
        self.excursion += delta;
    }

    pub fn clear_excursion(&mut self) {
        self.excursion = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let a = SensorSimulator::new(7).generate_batch(20);
        let b = SensorSimulator::new(7).generate_batch(20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamps_advance() {
        let mut sim = SensorSimulator::new(1);
        let batch = sim.generate_batch(5);

        assert!(batch.windows(2).all(|w| w[1].timestamp - w[0].timestamp == Duration::minutes(5)));
        assert_eq!(sim.get_sequence(), 5);
    }

    #[test]
    fn test_readings_carry_full_context() {
        let reading = SensorSimulator::new(3).generate();
        assert!(reading.external_temp.is_some());
        assert!(reading.wind_speed.is_some());
        assert!(reading.gps_lat.is_some());
        assert!(reading.door().is_some());
        assert!(reading.anomaly_label.is_none());
    }

    #[test]
    fn test_excursion_shifts_temperature() {
        let mut sim = SensorSimulator::new(11);
        sim.door_open_probability = 0.0;
        sim.inject_excursion(15.0);

        let hot = sim.generate();
        assert!(hot.temperature > 18.0);

        sim.clear_excursion();
        assert!(sim.generate().temperature < 5.0);
    }
}
