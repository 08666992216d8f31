//! CLI command tests

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands;

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_stats_default_top() {
    let cli = Cli::parse_from(["warroom", "stats"]);
    match cli.command {
        Commands::Stats { top } => assert_eq!(top, 5),
        _ => panic!("expected stats command"),
    }
}

#[test]
fn test_parse_ask_query() {
    let cli = Cli::parse_from(["warroom", "ask", "peak hours?"]);
    match cli.command {
        Commands::Ask { query } => assert_eq!(query, "peak hours?"),
        _ => panic!("expected ask command"),
    }
}

#[test]
fn test_parse_global_source_flag() {
    let cli = Cli::parse_from(["warroom", "--source", "trips.csv", "insights"]);
    assert_eq!(cli.resolved_source(), "trips.csv");
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::parse_from(["warroom", "serve"]);
    match cli.command {
        Commands::Serve { port, host, static_dir } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
            assert!(static_dir.is_none());
        }
        _ => panic!("expected serve command"),
    }
}

// ========== Command Tests ==========

#[tokio::test]
async fn test_cmd_status_sample() {
    let result = commands::cmd_status("sample").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_stats_sample() {
    let result = commands::cmd_stats("sample", 3).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_insights_sample() {
    let result = commands::cmd_insights("sample").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_predict_sample() {
    let result = commands::cmd_predict("sample").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_stats_missing_file_fails() {
    let result = commands::cmd_stats("/nonexistent/trips.csv", 5).await;
    assert!(result.is_err());
}
