//! OpenAI-compatible backend
//!
//! Works with any server implementing the `/v1/chat/completions` API.
//! Every request carries a hard timeout so a slow service degrades to
//! the template fallback instead of stalling the war room.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::insights;
use crate::models::Persona;
use crate::stats::TripAggregates;

use super::TextGenBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Chat-completion client for persona responses
#[derive(Clone)]
pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    /// Create a backend against a specific server
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        let timeout = std::env::var("WARROOM_TEXTGEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::with_timeout(base_url, model, api_key, Duration::from_secs(timeout))
    }

    /// Create a backend with an explicit request timeout
    pub fn with_timeout(
        base_url: &str,
        model: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    /// Create from environment variables
    ///
    /// Returns `None` when `OPENAI_API_KEY` is unset.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&base_url, &model, Some(&api_key)))
    }

    fn system_prompt(persona: Persona, agg: &TripAggregates) -> String {
        format!(
            "You are {}, {} in the Austin Mobility War Room. Answer in at \
             most three sentences, grounded in this briefing:\n{}",
            persona.name(),
            persona.tone(),
            insights::briefing(agg)
        )
    }

    async fn chat_completion(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(0.3),
            max_tokens: Some(300),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await.map_err(|e| {
            Error::TextGen(format!("request to {} failed: {}", self.base_url, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TextGen(format!(
                "chat completion error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::TextGen("empty chat completion response".into()))
    }
}

#[async_trait]
impl TextGenBackend for OpenAiBackend {
    async fn respond(
        &self,
        persona: Persona,
        query: &str,
        agg: &TripAggregates,
    ) -> Result<String> {
        debug!(persona = persona.as_str(), model = %self.model, "requesting chat completion");
        let system = Self::system_prompt(persona, agg);
        let text = self.chat_completion(&system, query).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::TextGen("blank completion text".into()));
        }
        Ok(trimmed.to_string())
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
