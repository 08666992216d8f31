//! Test utilities for warroom-core
//!
//! Provides a mock chat-completion server for integration tests of the
//! text-generation fallback path. Enabled with the `test-utils` feature.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::oneshot;

/// How the mock server answers chat completions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Answer immediately with a canned completion
    Respond,
    /// Sleep past any reasonable client timeout before answering
    Stall,
    /// Answer with a 500 error
    Fail,
}

/// Mock OpenAI-compatible server for testing
pub struct MockTextGenServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockTextGenServer {
    /// Start the mock server on an available port
    pub async fn start(mode: MockMode) -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(mode);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockTextGenServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({
        "object": "list",
        "data": [{ "id": "mock-model", "object": "model" }]
    }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    #[allow(dead_code)]
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    model: String,
    choices: Vec<serde_json::Value>,
}

async fn handle_chat(
    State(mode): State<MockMode>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, axum::http::StatusCode> {
    match mode {
        MockMode::Respond => {}
        MockMode::Stall => tokio::time::sleep(Duration::from_secs(3600)).await,
        MockMode::Fail => return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }

    Ok(Json(ChatResponse {
        model: request.model,
        choices: vec![json!({
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "Mock strategic assessment: hold the fleet near West Campus."
            },
            "finish_reason": "stop"
        })],
    }))
}
