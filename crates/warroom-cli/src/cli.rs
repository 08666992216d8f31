//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Warroom - Austin group rideshare strategy dashboard
#[derive(Parser)]
#[command(name = "warroom")]
#[command(about = "Austin Mobility War Room command center", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Dataset source: "sample", a URL, or a CSV file path
    ///
    /// Defaults to the WARROOM_DATA_URL environment variable, then to
    /// the embedded sample dataset.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The dataset source after applying the env fallback chain
    pub fn resolved_source(&self) -> String {
        self.source
            .clone()
            .unwrap_or_else(warroom_server::source_from_env)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dataset status
    Status,

    /// Show trip statistics
    Stats {
        /// How many top locations to list
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Show formatted insights
    Insights,

    /// Ask the three war-room personas a question
    Ask {
        /// The question, e.g. "where should we position during rush hour?"
        query: String,
    },

    /// Show persona predictions
    Predict,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
