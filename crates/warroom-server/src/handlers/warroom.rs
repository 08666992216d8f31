//! War-room query and prediction handlers

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use warroom_core::{ConversationTurn, PersonaResponse};

use crate::{AppError, AppState};

use super::sessions::win_scores;
use super::stats::load_aggregates;

/// Longest query the war room accepts
const MAX_QUERY_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    /// Optional session ID for conversation continuity
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub turn: ConversationTurn,
    /// Running win tally for the session, including this turn
    pub scores: BTreeMap<&'static str, usize>,
    pub processing_time_ms: u64,
}

/// POST /api/ask
///
/// Runs the query through all three personas and records the turn in
/// the session, creating one when the client did not supply an ID.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("query must not be empty"));
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(AppError::bad_request(&format!(
            "query must be at most {} characters",
            MAX_QUERY_LEN
        )));
    }

    let started = Instant::now();
    let (_, agg) = load_aggregates(&state).await?;

    debug!(query, "Running war-room query");
    let turn = state.responder.respond_all(query, &agg).await;

    let session_id = match request.session_id {
        Some(id) => id,
        None => state.sessions.create_session().await,
    };
    state.sessions.record_turn(&session_id, turn.clone()).await;
    let scores = win_scores(&state.sessions.get_turns(&session_id).await);

    Ok(Json(AskResponse {
        session_id,
        turn,
        scores,
        processing_time_ms: started.elapsed().as_millis() as u64,
    }))
}

#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<PersonaResponse>,
}

/// GET /api/predictions
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PredictionsResponse>, AppError> {
    let (_, agg) = load_aggregates(&state).await?;
    Ok(Json(PredictionsResponse {
        predictions: state.responder.predictions(&agg),
    }))
}
