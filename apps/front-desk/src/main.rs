//! Bistro front desk.
//!
//! Command line for booking, cancelling, and listing table reservations.
//!
//! ```sh
//! # Which tables are free?
//! front-desk tables --available
//!
//! # Book table 1 for tomorrow evening
//! front-desk book --name "Ana Silva" --phone 11999999999 --table 1 --at "02/03/2026 19:00"
//!
//! # VIP client with a 10% discount, JSON output
//! front-desk --json book --name "Carla Mendes" --phone 31977776666 --discount 10 --table 9 --at "02/03/2026 20:30"
//!
//! # Today's book, then cancel #1
//! front-desk list
//! front-desk cancel 1
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default filter); command
//! output goes to stdout.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bistro_db::{Database, DbConfig};
use bistro_engine::BookingEngine;

use crate::commands::Command;
use crate::config::FrontDeskConfig;
use crate::error::AppError;

/// Bistro front desk: table reservations for one restaurant.
#[derive(Parser, Debug)]
#[command(name = "front-desk", version, about)]
struct Cli {
    /// SQLite database file (overrides BISTRO_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(rendered) => {
            println!("{}", rendered);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if json {
                match serde_json::to_string_pretty(&err) {
                    Ok(body) => eprintln!("{}", body),
                    Err(_) => eprintln!("{}", err),
                }
            } else {
                eprintln!("{}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, AppError> {
    let mut config = FrontDeskConfig::load()?;
    if let Some(path) = cli.db {
        info!(db = %path.display(), "CLI override");
        config.db_path = path;
    }

    let db = Database::new(
        DbConfig::new(&config.db_path).max_connections(config.max_connections),
    )
    .await?;

    if config.seed_tables && cli.command != Command::Seed {
        let seeded = db.seed_default_tables().await?;
        if seeded > 0 {
            info!(tables = seeded, "Installed default floor plan");
        }
    }

    let engine = BookingEngine::new(Arc::new(db.clone()));
    let result = commands::execute(cli.command, &engine, &db).await;
    db.close().await;

    let output = result?;
    if cli.json {
        output.to_json()
    } else {
        Ok(output.to_text())
    }
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - Default: `info,bistro=debug,sqlx=warn`
/// - Override with RUST_LOG env var: `RUST_LOG=debug front-desk list`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bistro=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
