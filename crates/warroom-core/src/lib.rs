//! Warroom Core Library
//!
//! Shared functionality for the Austin Mobility War Room:
//! - Rideshare trip dataset loading (CSV over HTTP, file, or embedded sample)
//! - Descriptive trip aggregation (hourly, group-size, location rankings)
//! - Insight formatting for dashboards and briefings
//! - Three scripted personas with pluggable text generation

pub mod dataset;
pub mod error;
pub mod insights;
pub mod models;
pub mod personas;
pub mod stats;
pub mod textgen;

/// Test utilities including a mock chat-completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use dataset::{fetch_csv, parse_trips, sample_dataset, zone_for_address, DatasetCache};
pub use error::{Error, Result};
pub use models::{
    ConversationTurn, GroupSizeBucket, Location, Persona, PersonaResponse, ResponseSource,
    TripDataset, TripRecord,
};
pub use personas::{pick_winner, render_prediction, render_response, PersonaResponder, QueryTopic};
pub use stats::{aggregate, RankedLocation, TripAggregates};
pub use textgen::{OpenAiBackend, TemplateBackend, TextGenBackend, TextGenClient};
