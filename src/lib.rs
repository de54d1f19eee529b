//! ridelog: a bounded ride log with distance analytics.
//!
//! Rides (origin, destination, start and stop time) are recorded per user.
//! Only the most recent `capacity` rides of each user are retained (5 by
//! default); storing one more evicts that user's oldest ride by start time.
//!
//! # Views
//!
//! - **Distance report**: every retained ride with its Euclidean length,
//!   shortest first, as header-less CSV
//!   (`start_x,start_y,stop_x,stop_y,user_id,distance`).
//! - **Dispersion chart**: for one user, the population variance of ride
//!   distances over each prefix of their history (`1..=n`).
//!
//! # Storage
//!
//! The store is built on an injected [`core::storage::RideStorage`] handle.
//! The SQLite handle keeps `rides.db` under the store root and opens one
//! connection per logical operation through [`core::broker::DbBroker`].
//! Inserts for one user are serialized; different users insert in parallel.
//!
//! # Examples
//!
//! ```bash
//! ridelog init
//! ridelog store --user-id u1 --start-x 0 --start-y 0 --stop-x 3 --stop-y 4 \
//!     --start-time 1510000000 --stop-time 1510000600
//! ridelog stats
//! ridelog chart --user-id u1 --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: geometry, ride records, storage, the bounded store, analytics
//! - [`service`]: the four operations exposed to transports

mod cli;
pub mod core;
pub mod service;

use cli::{Cli, Command, OutputFormat};
use crate::core::{
    analytics::ChartData,
    config::{self, RideLogConfig},
    error, output,
    store::RideStore,
};
use service::RideService;

use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the stderr log subscriber, filtered by `RIDELOG_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("RIDELOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<(), error::RideLogError> {
    let cli = Cli::parse();
    let root = config::resolve_root(cli.root);
    let config = RideLogConfig::load(&root, cli.config.as_deref())?;
    debug!(?config, root = %root.display(), "resolved configuration");

    let service = RideService::new(RideStore::open(&root, &config)?);

    match cli.command {
        Command::Init => {
            println!("{}", service.reset()?);
        }
        Command::Store(args) => {
            let receipt = service.store_ride(&args.to_input())?;
            match args.format {
                OutputFormat::Text => {
                    if receipt.evicted > 0 {
                        eprintln!(
                            "{}",
                            format!(
                                "Dropping {} records for user_id {}",
                                receipt.evicted, receipt.user_id
                            )
                            .yellow()
                        );
                    }
                    println!("{}", receipt.echo);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&receipt)?);
                }
            }
        }
        Command::Stats => {
            print!("{}", service.distance_report_csv()?);
        }
        Command::Chart { user_id, format } => {
            let chart: ChartData = service.dispersion_chart(&user_id)?;
            match format {
                OutputFormat::Text => print!("{}", output::render_chart_text(&chart)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chart)?),
            }
        }
    }
    Ok(())
}
