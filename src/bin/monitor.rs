use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tankd::monitor::{self, MonitorOptions};
use tankd::Config;

#[derive(Parser)]
#[command(
    name = "tankd-monitor",
    version,
    about = "Reachability watchdog for the tank sensor"
)]
struct Cli {
    /// Sensor URL to probe, falls back to sensor.url from the config
    #[arg(long)]
    url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between probe cycles
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Ping timeout in seconds
    #[arg(long, default_value_t = 1)]
    ping_timeout: u64,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 2.0)]
    http_timeout: f64,

    /// Status log file, one line appended per cycle
    #[arg(long, default_value = "tankd-monitor.log")]
    log: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let sensor_url = match cli.url {
        Some(url) => url,
        None => {
            let config = Config::load(cli.config.as_deref())?;
            match config.sensor.url {
                Some(url) => url,
                None => bail!("no sensor URL: pass --url or set sensor.url in the config"),
            }
        }
    };

    let http_timeout = Duration::try_from_secs_f64(cli.http_timeout)
        .map_err(|_| anyhow::anyhow!("invalid --http-timeout {}", cli.http_timeout))?;

    monitor::run(MonitorOptions {
        sensor_url,
        interval: Duration::from_secs(cli.interval),
        ping_timeout_secs: cli.ping_timeout,
        http_timeout,
        log_path: cli.log,
    })
    .await?;

    Ok(())
}
