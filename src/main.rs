use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use travel_planner::config::TravelPlannerConfig;
use travel_planner::{db, telemetry, web};

#[derive(Parser)]
#[command(name = "travel-planner", version, about = "Plan trips around Art Institute artworks")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "TRAVEL_PLANNER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TravelPlannerConfig::load_from_path(cli.config)?;
    let _telemetry = telemetry::init(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!(version = travel_planner::VERSION, "Starting travel planner");
            web::run(config).await
        }
        Command::Migrate => {
            let pool = db::create_pool(&config.database.url, 1)
                .context("Failed to create database pool")?;
            let applied = db::run_migrations(&pool)?;
            info!(applied, "Migrations complete");
            Ok(())
        }
    }
}
