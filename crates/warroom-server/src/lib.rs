//! Warroom Web Server
//!
//! Axum-based REST API for the Austin Mobility War Room dashboard.
//! Serves trip statistics, formatted insights, persona responses, and
//! conversation sessions over JSON, with optional static file hosting
//! for the dashboard frontend.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use warroom_core::{DatasetCache, PersonaResponder, TextGenClient};

mod handlers;

/// Maximum hotspot ranking length a client can request
pub const MAX_HOTSPOT_LIMIT: usize = 50;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Dataset source: "sample", a URL, or a file path
    pub source: String,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            source: source_from_env(),
            allowed_origins: vec![],
        }
    }
}

/// Dataset source from `WARROOM_DATA_URL`, falling back to the sample
pub fn source_from_env() -> String {
    std::env::var("WARROOM_DATA_URL").unwrap_or_else(|_| "sample".to_string())
}

/// Shared application state
pub struct AppState {
    pub cache: DatasetCache,
    pub config: ServerConfig,
    pub responder: PersonaResponder,
    /// Session manager for war-room conversations
    pub sessions: handlers::SessionManager,
}

/// Create the application router around an existing dataset cache
pub fn create_router(cache: DatasetCache, config: ServerConfig, static_dir: Option<&str>) -> Router {
    create_router_with_responder(cache, config, static_dir, None)
}

/// Create the router with an explicit responder (for testing)
pub fn create_router_with_responder(
    cache: DatasetCache,
    config: ServerConfig,
    static_dir: Option<&str>,
    responder: Option<PersonaResponder>,
) -> Router {
    let responder = responder.unwrap_or_else(|| {
        let client = TextGenClient::from_env();
        match client {
            TextGenClient::OpenAi(_) => info!("Text generation configured (OpenAI-compatible)"),
            TextGenClient::Template(_) => {
                info!("ℹ️  Text generation not configured (set OPENAI_API_KEY to enable), using templates")
            }
        }
        PersonaResponder::new(client)
    });

    let state = Arc::new(AppState {
        cache,
        config: config.clone(),
        responder,
        sessions: handlers::SessionManager::new(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::get_stats))
        .route("/hotspots", get(handlers::get_hotspots))
        .route("/insights", get(handlers::get_insights))
        .route("/ask", post(handlers::ask))
        .route("/predictions", get(handlers::get_predictions))
        .route("/reload", post(handlers::reload_dataset))
        .route("/session", post(handlers::create_session))
        .route(
            "/session/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        );

    // Restrictive CORS by default, explicit origins when configured
    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
///
/// Loads the configured dataset before binding. A configured source
/// that cannot be loaded is a startup failure; the embedded sample is
/// used only when no source is configured.
pub async fn serve(
    config: ServerConfig,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    // Fail fast on an unreachable source rather than serving stale air.
    // The preloaded cache is the one threaded into AppState, so the
    // startup dataset keeps serving even if the source vanishes later.
    let cache = DatasetCache::new();
    let dataset = cache.load(&config.source).await?;
    info!(
        source = %config.source,
        trips = dataset.len(),
        skipped = dataset.skipped,
        "Dataset loaded"
    );
    if config.source == "sample" {
        info!("ℹ️  No dataset source configured (set WARROOM_DATA_URL), serving the embedded sample");
    }

    let responder = PersonaResponder::from_env();
    check_textgen_connection(&responder).await;

    let app = create_router_with_responder(cache, config, static_dir, Some(responder));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚁 War room listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Check and log text-generation backend reachability
async fn check_textgen_connection(responder: &PersonaResponder) {
    if responder.backend_label() == "template" {
        info!("Text generation: local templates");
    } else if responder.backend_healthy().await {
        info!(
            "✅ Text generation reachable: {} at {}",
            responder.backend_label(),
            responder.backend_host()
        );
    } else {
        warn!(
            "⚠️  Text generation configured but not responding: {}",
            responder.backend_host()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<warroom_core::Error> for AppError {
    fn from(err: warroom_core::Error) -> Self {
        match err {
            warroom_core::Error::DataUnavailable(msg) => {
                Self::unavailable(&format!("Dataset unavailable: {}", msg))
            }
            warroom_core::Error::DataFormat(msg) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: format!("Dataset format error: {}", msg),
                internal: None,
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(other.into()),
            },
        }
    }
}
