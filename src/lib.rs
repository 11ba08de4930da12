//! # tankd
//!
//! A self-hosted fill-level monitor for a horizontal cylindrical tank:
//! - polls an ultrasonic distance sensor over HTTP (or simulates one)
//! - appends readings to a SQLite history with duplicate filtering
//! - converts sensor distance to liters via the circular-segment formula
//! - serves the current level, time-windowed extremes and a dashboard
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   fetch    ┌───────────┐   insert   ┌──────────────┐
//! │  Sensor    │ ◄───────── │ Collector │ ─────────► │ ReadingStore │
//! │ (real/sim) │            │  (tokio)  │            │   (SQLite)   │
//! └────────────┘            └───────────┘            └──────┬───────┘
//!                                                           │ query
//!                           ┌───────────┐            ┌──────▼───────┐
//!                           │ Geometry  │ ◄───────── │   HTTP API   │
//!                           │ converter │   volume   │    (axum)    │
//!                           └───────────┘            └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the daemon
//! ```bash
//! tankd serve --bind 0.0.0.0:8080 --db ./tankd.sqlite3 --mode sim
//! ```
//!
//! ### Query it
//! ```bash
//! curl http://localhost:8080/api/last
//! curl "http://localhost:8080/api/extremes?period=week&order=min&n=3"
//! curl http://localhost:8080/api/dashboard
//! ```
//!
//! ### Watch the sensor from another host
//! ```bash
//! tankd-monitor --url http://tank-sensor.local/distance --interval 60
//! ```

pub mod common;
pub mod monitor;
pub mod sensor;
pub mod server;
pub mod store;
pub mod tank;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use server::Server;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
