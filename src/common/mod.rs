//! Common utilities and types shared across tankd

pub mod config;
pub mod error;
pub mod utils;

pub use config::{CollectConfig, Config, SensorConfig, SensorMode};
pub use error::{Error, Result};
pub use utils::unix_epoch_now;
