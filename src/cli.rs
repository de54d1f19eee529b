//! CLI struct definitions for the ridelog command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::ride::RideInput;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "ridelog",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep the most recent rides per user and report on their distances."
)]
pub(crate) struct Cli {
    /// Store directory (defaults to $RIDELOG_ROOT, then ./.ridelog).
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Configuration file (defaults to <root>/ridelog.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Drop every stored ride and recreate the store
    Init,

    /// Store one ride, evicting the user's oldest rides past capacity
    Store(StoreArgs),

    /// Print every ride sorted by distance as CSV
    Stats,

    /// Print a user's running distance dispersion
    Chart {
        #[clap(long)]
        user_id: String,
        /// Output format: 'text' or 'json'.
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct StoreArgs {
    #[clap(long)]
    pub user_id: String,
    #[clap(long, allow_hyphen_values = true)]
    pub start_x: String,
    #[clap(long, allow_hyphen_values = true)]
    pub start_y: String,
    #[clap(long, allow_hyphen_values = true)]
    pub stop_x: String,
    #[clap(long, allow_hyphen_values = true)]
    pub stop_y: String,
    /// Epoch seconds.
    #[clap(long, allow_hyphen_values = true)]
    pub start_time: String,
    /// Epoch seconds.
    #[clap(long, allow_hyphen_values = true)]
    pub stop_time: String,
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl StoreArgs {
    pub fn to_input(&self) -> RideInput {
        RideInput {
            user_id: self.user_id.clone(),
            start_x: self.start_x.clone(),
            start_y: self.start_y.clone(),
            stop_x: self.stop_x.clone(),
            stop_y: self.stop_y.clone(),
            start_time: self.start_time.clone(),
            stop_time: self.stop_time.clone(),
        }
    }
}
