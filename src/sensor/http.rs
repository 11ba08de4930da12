//! Real device client
//!
//! Fetches the device's JSON endpoint and keeps the last capture as internal
//! state with a freshness window: callers that do not force a refresh reuse
//! a recent capture instead of re-polling the device.

use crate::common::{unix_epoch_now, Error, Result};
use crate::sensor::{SensorSample, SensorSource};
use serde::Deserialize;
use std::time::Duration;

/// Device payload; missing fields fall back to error sentinels so the
/// storage pre-filter rejects the capture
#[derive(Debug, Deserialize)]
struct DevicePayload {
    #[serde(default = "missing_distance")]
    distance_cm: i64,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    ip: String,
}

fn missing_distance() -> i64 {
    -1
}

/// HTTP client for the physical sensor
pub struct HttpSensor {
    url: String,
    client: reqwest::Client,
    cache_ttl: Duration,
    cache: Option<SensorSample>,
}

impl HttpSensor {
    pub fn new(url: String, cache_ttl_seconds: u64, http_timeout_seconds: f64) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(http_timeout_seconds).map_err(|_| {
            Error::InvalidConfig(format!(
                "invalid sensor http timeout: {http_timeout_seconds}"
            ))
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url,
            client,
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            cache: None,
        })
    }

    /// Last capture, while it is younger than the freshness window
    fn cached(&self) -> Option<SensorSample> {
        let sample = self.cache.as_ref()?;
        let age = unix_epoch_now() - sample.fetched_at_epoch;
        if age < self.cache_ttl.as_secs_f64() {
            Some(sample.clone())
        } else {
            None
        }
    }
}

impl SensorSource for HttpSensor {
    async fn fetch(&mut self, force_refresh: bool) -> Result<SensorSample> {
        if !force_refresh {
            if let Some(sample) = self.cached() {
                return Ok(sample);
            }
        }

        let payload: DevicePayload = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let sample = SensorSample {
            distance_cm: payload.distance_cm,
            timestamp: payload.timestamp,
            ip: payload.ip,
            fetched_at_epoch: unix_epoch_now(),
        };
        self.cache = Some(sample.clone());
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor_with_cache(age_seconds: f64, ttl: u64) -> HttpSensor {
        let mut sensor =
            HttpSensor::new("http://sensor.invalid/distance".to_string(), ttl, 2.0).unwrap();
        sensor.cache = Some(SensorSample {
            distance_cm: 50,
            timestamp: "t".to_string(),
            ip: "10.0.0.7".to_string(),
            fetched_at_epoch: unix_epoch_now() - age_seconds,
        });
        sensor
    }

    #[test]
    fn test_cache_freshness_window() {
        assert!(sensor_with_cache(1.0, 10).cached().is_some());
        assert!(sensor_with_cache(11.0, 10).cached().is_none());

        let empty = HttpSensor::new("http://sensor.invalid/distance".to_string(), 10, 2.0).unwrap();
        assert!(empty.cached().is_none());
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(HttpSensor::new("http://sensor.invalid/distance".to_string(), 10, -1.0).is_err());
        assert!(HttpSensor::new("http://sensor.invalid/distance".to_string(), 10, f64::NAN).is_err());
    }

    #[test]
    fn test_payload_defaults_to_sentinels() {
        let payload: DevicePayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.distance_cm, -1);
        assert!(payload.timestamp.is_empty());
        assert!(payload.ip.is_empty());

        let payload: DevicePayload =
            serde_json::from_str(r#"{"distance_cm": 87, "timestamp": "x", "ip": "10.0.0.7"}"#)
                .unwrap();
        assert_eq!(payload.distance_cm, 87);
        assert_eq!(payload.timestamp, "x");
    }
}
