use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tankd::common::SensorMode;
use tankd::{Config, Server};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tankd", version, about = "Tank level monitor daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon (collector + HTTP API)
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bind address for the HTTP API, overrides the config file
        #[arg(long)]
        bind: Option<String>,

        /// SQLite database path, overrides the config file
        #[arg(long)]
        db: Option<PathBuf>,

        /// Sensor mode ("real" or "sim"), overrides the config file
        #[arg(long)]
        mode: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            db,
            mode,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(bind) = bind {
                config.bind_addr = bind.parse()?;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(mode) = mode {
                config.mode = mode.parse::<SensorMode>()?;
            }
            config.validate()?;

            tracing_subscriber::registry()
                .with(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            Server::new(config).serve().await?;
        }
    }

    Ok(())
}
