//! Error types for the War Room

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(String),

    #[error("Dataset format error: {0}")]
    DataFormat(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Text generation error: {0}")]
    TextGen(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
