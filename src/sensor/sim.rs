//! Simulated sensor
//!
//! Random walk around the configured base distance, for running without the
//! physical device.

use crate::common::{unix_epoch_now, Result};
use crate::sensor::{SensorSample, SensorSource};
use rand::seq::SliceRandom;
use rand::Rng;

/// Drift steps, zero-heavy so the level changes slowly between polls
const DRIFT_STEPS: [i64; 5] = [-1, 0, 0, 0, 1];

pub struct SimSensor {
    last_distance_cm: i64,
}

impl SimSensor {
    pub fn new(base_distance_cm: i64) -> Self {
        Self {
            last_distance_cm: base_distance_cm.max(0),
        }
    }
}

impl SensorSource for SimSensor {
    async fn fetch(&mut self, _force_refresh: bool) -> Result<SensorSample> {
        let (drift, noise) = {
            let mut rng = rand::thread_rng();
            let drift = DRIFT_STEPS.choose(&mut rng).copied().unwrap_or(0);
            (drift, rng.gen_range(-2i64..=2))
        };
        self.last_distance_cm = (self.last_distance_cm + drift + noise).max(0);

        Ok(SensorSample {
            distance_cm: self.last_distance_cm,
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%z")
                .to_string(),
            ip: "simulated".to_string(),
            fetched_at_epoch: unix_epoch_now(),
        })
    }
}
