//! Direct-message handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carelink_store::Message;

use crate::api::AppState;
use crate::error::ServerError;
use crate::sessions::Session;

#[derive(Deserialize)]
pub struct SendRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

/// `POST /messages` — send a message to another user.
pub async fn send(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SendRequest>,
) -> Result<Json<Message>, ServerError> {
    if req.body.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "Message body cannot be empty".to_string(),
        ));
    }
    if req.recipient_id == session.profile_id {
        return Err(ServerError::BadRequest(
            "Cannot message yourself".to_string(),
        ));
    }

    let message = Message {
        id: Uuid::new_v4(),
        sender_id: session.profile_id,
        recipient_id: req.recipient_id,
        body: req.body,
        read: false,
        created_at: Utc::now(),
    };

    let db = state.db.lock().await;
    // The recipient must exist; surfaces 404 otherwise.
    db.get_profile(req.recipient_id)?;
    db.insert_message(&message)?;

    Ok(Json(message))
}

/// `GET /messages/with/:peer_id` — the conversation between the caller and
/// a peer, oldest first.
pub async fn conversation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(peer_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.conversation(session.profile_id, peer_id)?))
}

/// `POST /messages/:id/read` — only the recipient may mark a message read.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ServerError> {
    let db = state.db.lock().await;
    let message = db.get_message(id)?;
    if message.recipient_id != session.profile_id {
        return Err(ServerError::Forbidden(
            "Only the recipient may mark a message read".to_string(),
        ));
    }

    db.mark_message_read(id)?;
    Ok(Json(db.get_message(id)?))
}

#[derive(Serialize)]
pub struct UnreadResponse {
    pub unread: u64,
}

/// `GET /messages/unread-count`.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<UnreadResponse>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(UnreadResponse {
        unread: db.unread_count(session.profile_id)?,
    }))
}
