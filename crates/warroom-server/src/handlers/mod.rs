//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod sessions;
pub mod stats;
pub mod warroom;

// Re-export all handlers for use in router
pub use sessions::*;
pub use stats::*;
pub use warroom::*;
