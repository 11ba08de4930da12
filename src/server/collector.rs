//! Background reading collector
//!
//! A fixed-tick task that polls the sensor, drops invalid captures and
//! stores the rest with duplicate filtering. A failed tick is logged and
//! the loop carries on; cancellation stops it between ticks.

use crate::common::{Error, Result};
use crate::sensor::SensorSource;
use crate::store::ReadingStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Floor for the poll interval, in seconds
const MIN_INTERVAL_SECS: u64 = 5;

/// Upper bound on a single sensor fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Periodic sensor poller writing into a [`ReadingStore`]
pub struct Collector<S> {
    sensor: S,
    store: ReadingStore,
    tick: Duration,
}

impl<S: SensorSource + Send + 'static> Collector<S> {
    pub fn new(sensor: S, store: ReadingStore, interval_seconds: u64) -> Self {
        Self {
            sensor,
            store,
            tick: Duration::from_secs(interval_seconds.max(MIN_INTERVAL_SECS)),
        }
    }

    /// Runs the collection loop on the runtime until cancelled
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Collector started (every {:?})", self.tick);
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.collect_once().await {
                        if e.is_transient() {
                            tracing::warn!("Collection tick failed: {}", e);
                        } else {
                            tracing::error!("Collection tick failed: {}", e);
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("Collector stopping");
                    break;
                }
            }
        }
    }

    async fn collect_once(&mut self) -> Result<()> {
        let sample = timeout(FETCH_TIMEOUT, self.sensor.fetch(true))
            .await
            .map_err(|_| Error::Timeout("sensor fetch".into()))??;

        if !sample.is_valid() {
            tracing::debug!(
                "Discarding invalid sample (distance_cm={}, timestamp={:?})",
                sample.distance_cm,
                sample.timestamp
            );
            return Ok(());
        }

        let distance_cm = sample.distance_cm;
        let store = self.store.clone();
        let inserted = tokio::task::spawn_blocking(move || store.insert(&sample, true))
            .await
            .map_err(|e| Error::Internal(format!("insert task failed: {e}")))??;

        if inserted {
            tracing::debug!("Stored reading (distance_cm={})", distance_cm);
        } else {
            tracing::debug!("Skipped duplicate sensor timestamp");
        }
        Ok(())
    }
}
