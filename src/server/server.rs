//! Process wiring for the tankd daemon
//!
//! Opens the reading store, starts the collector for the configured sensor
//! and serves the HTTP API until a shutdown signal arrives.

use crate::common::{Config, Error, Result, SensorMode};
use crate::sensor::{HttpSensor, SimSensor};
use crate::server::collector::Collector;
use crate::server::http::{create_router, AppState};
use crate::store::ReadingStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the daemon until ctrl-c
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting tankd {}", crate::VERSION);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  DB path: {}", self.config.db_path.display());
        match self.config.mode {
            SensorMode::Real => tracing::info!(
                "  Sensor: real ({})",
                self.config.sensor.url.as_deref().unwrap_or("<unset>")
            ),
            SensorMode::Sim => tracing::info!(
                "  Sensor: simulated (base {} cm)",
                self.config.sensor.sim_base_distance_cm
            ),
        }
        tracing::info!("  Poll interval: {}s", self.config.collect.interval_seconds);

        // Initialize reading store
        let store = ReadingStore::open(&self.config.db_path)?;

        // Start the collector with the configured sensor
        let cancel = CancellationToken::new();
        let interval = self.config.collect.interval_seconds;
        let collector = match self.config.mode {
            SensorMode::Real => {
                let url = self.config.sensor.url.clone().ok_or_else(|| {
                    Error::InvalidConfig("sensor.url is required when mode = \"real\"".to_string())
                })?;
                let sensor = HttpSensor::new(
                    url,
                    self.config.sensor.cache_ttl_seconds,
                    self.config.sensor.http_timeout_seconds,
                )?;
                Collector::new(sensor, store.clone(), interval).spawn(cancel.clone())
            }
            SensorMode::Sim => {
                let sensor = SimSensor::new(self.config.sensor.sim_base_distance_cm);
                Collector::new(sensor, store.clone(), interval).spawn(cancel.clone())
            }
        };

        // Create HTTP server
        let bind_addr = self.config.bind_addr;
        let state = AppState {
            store,
            config: Arc::new(self.config),
        };
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        let http_server = axum::serve(listener, router);
        tracing::info!("✓ tankd ready");

        tokio::select! {
            res = http_server => {
                if let Err(e) = res {
                    tracing::error!("HTTP server error: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }

        cancel.cancel();
        if let Err(e) = collector.await {
            tracing::warn!("Collector task ended abnormally: {}", e);
        }

        Ok(())
    }
}
