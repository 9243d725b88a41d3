//! Netlens CLI - Inspect captured network traffic
//!
//! Usage:
//!   netlens list <HAR>              List calls from a HAR capture
//!   netlens inspect <HAR> <ID>      Show one call with highlights
//!   netlens tail                    Follow live capture events on stdin
//!   netlens filter <ACTION>         Manage saved filter rules
//!   netlens search <ACTION>         Manage the saved search config

mod commands;
mod config;
mod har;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "netlens")]
#[command(author = "Netlens Team")]
#[command(version)]
#[command(about = "Inspect captured network traffic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List calls from a HAR capture
    List {
        /// Path to the HAR file
        har: PathBuf,

        #[command(flatten)]
        search: commands::SearchArgs,

        /// Ignore saved filter rules
        #[arg(short, long)]
        all: bool,
    },

    /// Show one call with identifiers and search matches highlighted
    Inspect {
        /// Path to the HAR file
        har: PathBuf,

        /// Call ID (or prefix)
        id: String,

        /// Search query to highlight
        #[arg(short, long)]
        query: Option<String>,

        /// Index of the current match
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Show the request payload instead of the response body
        #[arg(long)]
        payload: bool,
    },

    /// Read live capture events (one JSON object per line) from stdin
    Tail {
        /// Ignore saved filter rules
        #[arg(short, long)]
        all: bool,
    },

    /// Manage saved filter rules
    Filter {
        #[command(subcommand)]
        action: commands::filter::FilterAction,
    },

    /// Manage the saved search config
    Search {
        #[command(subcommand)]
        action: commands::search::SearchAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},netlens_core={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    // Ensure config directories exist
    config::ensure_dirs()?;
    let settings = config::Config::load()?;

    match cli.command {
        Commands::List { har, search, all } => {
            commands::list::run(&settings, &har, &search, all).await?;
        }

        Commands::Inspect {
            har,
            id,
            query,
            index,
            payload,
        } => {
            let opts = commands::inspect::InspectOptions {
                har,
                id,
                query,
                index,
                payload,
            };
            commands::inspect::run(&settings, opts).await?;
        }

        Commands::Tail { all } => {
            commands::tail::run(all).await?;
        }

        Commands::Filter { action } => {
            commands::filter::run(action)?;
        }

        Commands::Search { action } => {
            commands::search::run(action)?;
        }
    }

    Ok(())
}
