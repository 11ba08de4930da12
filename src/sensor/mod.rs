//! Sensor clients
//!
//! `SensorSource` abstracts where readings come from, so the collector can
//! run against the real device or a simulator. The implementation is chosen
//! once at startup from `Config::mode`.

pub mod http;
pub mod sim;

pub use http::HttpSensor;
pub use sim::SimSensor;

use crate::common::Result;
use std::future::Future;

/// One capture from a sensor, before storage
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    /// Distance to the liquid surface; negative is the device's error sentinel
    pub distance_cm: i64,
    /// Device-reported timestamp label
    pub timestamp: String,
    /// Device address, diagnostic only
    pub ip: String,
    /// Local Unix clock at capture
    pub fetched_at_epoch: f64,
}

impl SensorSample {
    /// Storage pre-filter: reject error sentinels and unlabeled captures
    pub fn is_valid(&self) -> bool {
        self.distance_cm >= 0 && !self.timestamp.is_empty()
    }
}

/// A source of tank readings
pub trait SensorSource {
    /// Capture a reading. `force_refresh` bypasses any internal freshness
    /// cache.
    fn fetch(&mut self, force_refresh: bool) -> impl Future<Output = Result<SensorSample>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validity() {
        let mut sample = SensorSample {
            distance_cm: 42,
            timestamp: "2024-05-01T12:00:00+0200".to_string(),
            ip: "10.0.0.7".to_string(),
            fetched_at_epoch: 1_714_000_000.0,
        };
        assert!(sample.is_valid());

        sample.distance_cm = -1;
        assert!(!sample.is_valid());

        sample.distance_cm = 0;
        assert!(sample.is_valid());

        sample.timestamp.clear();
        assert!(!sample.is_valid());
    }
}
