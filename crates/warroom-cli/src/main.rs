//! Warroom CLI - Austin Mobility War Room
//!
//! Usage:
//!   warroom status                  Show dataset status
//!   warroom stats                   Show trip statistics
//!   warroom insights                Show formatted insights
//!   warroom ask "peak hours?"       Query the three personas
//!   warroom predict                 Show persona predictions
//!   warroom serve --port 3000       Start the web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let source = cli.resolved_source();

    match cli.command {
        Commands::Status => commands::cmd_status(&source).await,
        Commands::Stats { top } => commands::cmd_stats(&source, top).await,
        Commands::Insights => commands::cmd_insights(&source).await,
        Commands::Ask { query } => commands::cmd_ask(&source, &query).await,
        Commands::Predict => commands::cmd_predict(&source).await,
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&source, &host, port, static_dir.as_deref()).await,
    }
}
