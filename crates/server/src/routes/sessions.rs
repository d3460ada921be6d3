use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chat::ChatMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A session and its full message log
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

/// Body of `POST /api/sessions/{id}/messages`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub session_id: String,
    /// `None` only if the session did not need a reply.
    pub reply: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Open a new conversation
pub async fn create_session(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let (session_id, session) = state.create_session();
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            messages: session.messages().to_vec(),
        }),
    )
}

/// Current message log of a conversation
pub async fn get_session(
    State(state): State<Arc<ServerState>>,
    Path(session_id): Path<String>,
) -> ServerResult<Json<SessionResponse>> {
    let session = state.session(&session_id)?;
    let messages = session.chat.lock().await.messages().to_vec();
    Ok(Json(SessionResponse {
        session_id,
        messages,
    }))
}

/// Send a user message and wait for the assistant's reply
pub async fn post_message(
    State(state): State<Arc<ServerState>>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ServerResult<Json<MessageResponse>> {
    if request.content.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "message content must not be empty".to_string(),
        ));
    }

    let session = state.session(&session_id)?;
    let mut guard = session.chat.lock().await;
    let turn = state.worker.turn(guard.clone(), request.content).await?;
    *guard = turn.session;

    Ok(Json(MessageResponse {
        session_id,
        reply: turn.reply,
        messages: guard.messages().to_vec(),
    }))
}

/// Clear the conversation back to the greeting
pub async fn clear_messages(
    State(state): State<Arc<ServerState>>,
    Path(session_id): Path<String>,
) -> ServerResult<Json<SessionResponse>> {
    let session = state.session(&session_id)?;
    let mut guard = session.chat.lock().await;
    guard.clear();
    tracing::info!(session_id = %session_id, "session_cleared");
    Ok(Json(SessionResponse {
        session_id,
        messages: guard.messages().to_vec(),
    }))
}
