//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ask` - Persona query and prediction commands
//! - `serve` - Web server command
//! - `status` - Status/stats/insights commands

pub mod ask;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use ask::*;
pub use serve::*;
pub use status::*;

use warroom_core::{DatasetCache, Result as CoreResult, TripDataset};

/// Load the dataset for a one-shot command
pub(crate) async fn load_dataset(source: &str) -> CoreResult<std::sync::Arc<TripDataset>> {
    DatasetCache::new().load(source).await
}
