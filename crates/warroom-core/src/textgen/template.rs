//! Deterministic template backend
//!
//! Renders the scripted persona responses. Always available, never
//! fails, and produces the same text for the same query and aggregates.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Persona;
use crate::personas;
use crate::stats::TripAggregates;

use super::TextGenBackend;

#[derive(Debug, Clone, Default)]
pub struct TemplateBackend;

impl TemplateBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenBackend for TemplateBackend {
    async fn respond(
        &self,
        persona: Persona,
        query: &str,
        agg: &TripAggregates,
    ) -> Result<String> {
        Ok(personas::render_response(persona, query, agg))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "template"
    }

    fn host(&self) -> &str {
        "local"
    }
}
