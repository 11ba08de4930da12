//! Configuration for tankd
//!
//! Sources, lowest to highest priority: built-in defaults, a TOML file
//! (`--config` path, else `$TANKD_CONFIG`, else `./tankd.toml` when present),
//! then `TANKD_*` environment variables with `__` separating nested keys
//! (e.g. `TANKD_MODE=sim`, `TANKD_SENSOR__URL=http://...`).

use crate::common::{Error, Result};
use crate::tank::TankGeometry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which sensor implementation feeds the collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    #[default]
    Real,
    Sim,
}

impl std::fmt::Display for SensorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorMode::Real => write!(f, "real"),
            SensorMode::Sim => write!(f, "sim"),
        }
    }
}

impl FromStr for SensorMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "real" => Ok(SensorMode::Real),
            "sim" | "simulated" => Ok(SensorMode::Sim),
            other => Err(Error::InvalidConfig(format!(
                "unknown sensor mode: {other} (expected real or sim)"
            ))),
        }
    }
}

/// Sensor client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Device endpoint returning `{"distance_cm": .., "timestamp": .., "ip": ..}`
    #[serde(default)]
    pub url: Option<String>,

    /// How long a fetched reading stays fresh for non-forced fetches
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Per-request timeout toward the device
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: f64,

    /// Starting distance for the simulator's random walk
    #[serde(default = "default_sim_base")]
    pub sim_base_distance_cm: i64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            url: None,
            cache_ttl_seconds: default_cache_ttl(),
            http_timeout_seconds: default_http_timeout(),
            sim_base_distance_cm: default_sim_base(),
        }
    }
}

/// Collector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Seconds between sensor polls (the collector clamps this to at least 5)
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sensor selection: poll the real device or simulate one
    #[serde(default)]
    pub mode: SensorMode,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// HTTP API bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub collect: CollectConfig,

    /// Tank dimensions used by the volume converter
    #[serde(default)]
    pub tank: TankGeometry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: SensorMode::default(),
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            sensor: SensorConfig::default(),
            collect: CollectConfig::default(),
            tank: TankGeometry::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TANKD_CONFIG").ok().map(PathBuf::from));

        let mut builder = config::Config::builder();
        builder = match file {
            Some(p) => builder.add_source(config::File::from(p)),
            None => builder.add_source(config::File::with_name("tankd").required(false)),
        };
        builder = builder.add_source(
            config::Environment::with_prefix("TANKD")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.mode == SensorMode::Real
            && self
                .sensor
                .url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::InvalidConfig(
                "sensor.url is required when mode = \"real\"".into(),
            ));
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tankd.sqlite3")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_ttl() -> u64 {
    10
}

fn default_http_timeout() -> f64 {
    2.0
}

fn default_sim_base() -> i64 {
    30
}

fn default_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mode, SensorMode::Real);
        assert_eq!(config.db_path, PathBuf::from("tankd.sqlite3"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.collect.interval_seconds, 60);
        assert_eq!(config.sensor.cache_ttl_seconds, 10);
        assert_eq!(config.tank.total_volume_liters, 10_000.0);
    }

    #[test]
    fn test_validate_real_requires_url() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.sensor.url = Some("http://sensor.local/distance".into());
        assert!(config.validate().is_ok());

        config.sensor.url = Some("   ".into());
        assert!(config.validate().is_err());

        config.mode = SensorMode::Sim;
        config.sensor.url = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("real".parse::<SensorMode>().unwrap(), SensorMode::Real);
        assert_eq!("SIM".parse::<SensorMode>().unwrap(), SensorMode::Sim);
        assert_eq!("simulated".parse::<SensorMode>().unwrap(), SensorMode::Sim);
        assert!("bogus".parse::<SensorMode>().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tankd.toml");
        std::fs::write(
            &path,
            r#"
mode = "sim"
db_path = "/tmp/custom.sqlite3"

[collect]
interval_seconds = 120

[tank]
diameter_cm = 100.0
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.mode, SensorMode::Sim);
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.sqlite3"));
        assert_eq!(config.collect.interval_seconds, 120);
        assert_eq!(config.tank.diameter_cm, 100.0);
        // Fields absent from the file keep their defaults
        assert_eq!(config.tank.length_cm, 436.4);
    }
}
