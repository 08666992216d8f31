//! Pluggable text-generation abstraction
//!
//! Persona answers can come from an external chat-completion service or
//! from the built-in deterministic templates. The rest of the crate
//! talks to the [`TextGenClient`] enum and never cares which.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_API_KEY`: enables the OpenAI-compatible backend (required for it)
//! - `OPENAI_BASE_URL`: server URL (default: https://api.openai.com)
//! - `OPENAI_MODEL`: model name (default: gpt-4o-mini)
//! - `WARROOM_TEXTGEN_TIMEOUT_SECS`: per-request timeout (default: 10)

mod openai;
mod template;

pub use openai::OpenAiBackend;
pub use template::TemplateBackend;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Persona, ResponseSource};
use crate::stats::TripAggregates;

/// Interface every text-generation backend implements
///
/// Backends are Send + Sync so a client can be shared across tasks.
#[async_trait]
pub trait TextGenBackend: Send + Sync {
    /// Produce one persona's answer to a query, given the current aggregates
    async fn respond(&self, persona: Persona, query: &str, agg: &TripAggregates)
        -> Result<String>;

    /// Whether the backend can currently serve requests
    async fn health_check(&self) -> bool;

    /// Model name, for logging
    fn model(&self) -> &str;

    /// Where the backend runs, for logging and status output
    fn host(&self) -> &str;
}

/// Concrete text-generation client
///
/// Provides Clone and compile-time dispatch without `Box<dyn>` overhead.
#[derive(Clone)]
pub enum TextGenClient {
    /// OpenAI-compatible chat completion server
    OpenAi(OpenAiBackend),
    /// Local deterministic persona templates
    Template(TemplateBackend),
}

impl TextGenClient {
    /// Create a client from environment variables
    ///
    /// Uses the OpenAI backend when `OPENAI_API_KEY` is set, the
    /// template backend otherwise. Never fails: the templates are
    /// always available.
    pub fn from_env() -> Self {
        match OpenAiBackend::from_env() {
            Some(backend) => TextGenClient::OpenAi(backend),
            None => TextGenClient::Template(TemplateBackend::new()),
        }
    }

    /// Create a template-only client
    pub fn template() -> Self {
        TextGenClient::Template(TemplateBackend::new())
    }

    /// Create an OpenAI backend directly (tests point this at a mock server)
    pub fn openai(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        TextGenClient::OpenAi(OpenAiBackend::new(base_url, model, api_key))
    }

    /// How responses from this client should be labeled
    pub fn source(&self) -> ResponseSource {
        match self {
            TextGenClient::OpenAi(_) => ResponseSource::Generated,
            TextGenClient::Template(_) => ResponseSource::Template,
        }
    }
}

#[async_trait]
impl TextGenBackend for TextGenClient {
    async fn respond(
        &self,
        persona: Persona,
        query: &str,
        agg: &TripAggregates,
    ) -> Result<String> {
        match self {
            TextGenClient::OpenAi(b) => b.respond(persona, query, agg).await,
            TextGenClient::Template(b) => b.respond(persona, query, agg).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            TextGenClient::OpenAi(b) => b.health_check().await,
            TextGenClient::Template(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            TextGenClient::OpenAi(b) => b.model(),
            TextGenClient::Template(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            TextGenClient::OpenAi(b) => b.host(),
            TextGenClient::Template(b) => b.host(),
        }
    }
}
