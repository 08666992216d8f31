//! War-room conversation sessions
//!
//! Sessions keep the turn history for a dashboard tab so follow-up
//! questions can show the running battle log. Sessions live in memory
//! and expire after 30 minutes of inactivity.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use warroom_core::{ConversationTurn, Persona};

use crate::{AppError, AppState};

/// Session timeout (30 minutes of inactivity)
const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Maximum turns to keep per session (most recent win)
const MAX_HISTORY_TURNS: usize = 20;

/// A war-room session with conversation history
#[derive(Debug, Clone)]
pub struct WarRoomSession {
    pub created_at: Instant,
    pub last_activity: Instant,
    pub turns: Vec<ConversationTurn>,
}

impl WarRoomSession {
    fn new() -> Self {
        Self {
            created_at: Instant::now(),
            last_activity: Instant::now(),
            turns: Vec::new(),
        }
    }

    fn is_expired(&self) -> bool {
        self.last_activity.elapsed() > SESSION_TIMEOUT
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn add_turn(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if self.turns.len() > MAX_HISTORY_TURNS {
            let start = self.turns.len() - MAX_HISTORY_TURNS;
            self.turns.drain(..start);
        }
        self.touch();
    }
}

/// In-memory session manager
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, WarRoomSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new session and return its ID
    pub async fn create_session(&self) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut hasher = Sha256::new();
        hasher.update(timestamp.to_le_bytes());
        let hash = hasher.finalize();
        let session_id = format!("war_{:x}", hash)[..20].to_string();

        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        sessions.retain(|_, s| !s.is_expired());

        sessions.insert(session_id.clone(), WarRoomSession::new());
        session_id
    }

    /// Append a turn, creating the session if it does not exist
    pub async fn record_turn(&self, session_id: &str, turn: ConversationTurn) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(WarRoomSession::new)
            .add_turn(turn);
    }

    /// Get a session's turns (empty if not found or expired)
    pub async fn get_turns(&self, session_id: &str) -> Vec<ConversationTurn> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// Delete a session
    pub async fn delete_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    /// Get session info
    pub async fn get_session_info(&self, session_id: &str) -> Option<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .map(|s| SessionInfo {
                session_id: session_id.to_string(),
                turn_count: s.turns.len(),
                created_at_secs_ago: s.created_at.elapsed().as_secs(),
                last_activity_secs_ago: s.last_activity.elapsed().as_secs(),
                scores: win_scores(&s.turns),
                turns: s.turns.clone(),
            })
    }
}

/// Running win tally per persona across a session's turns
pub fn win_scores(turns: &[ConversationTurn]) -> BTreeMap<&'static str, usize> {
    let mut scores: BTreeMap<&'static str, usize> = Persona::all()
        .iter()
        .map(|persona| (persona.as_str(), 0))
        .collect();
    for turn in turns {
        *scores.entry(turn.winner.as_str()).or_insert(0) += 1;
    }
    scores
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub turn_count: usize,
    pub created_at_secs_ago: u64,
    pub last_activity_secs_ago: u64,
    pub scores: BTreeMap<&'static str, usize>,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// POST /api/session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Json<CreateSessionResponse> {
    let session_id = state.sessions.create_session().await;
    Json(CreateSessionResponse { session_id })
}

/// GET /api/session/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, AppError> {
    state
        .sessions
        .get_session_info(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("Session not found or expired"))
}

/// DELETE /api/session/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.sessions.delete_session(&id).await {
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(AppError::not_found("Session not found"))
    }
}
