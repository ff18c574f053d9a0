//! Conversation and message route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use skillx_core::{ConversationId, MessageId, UserId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Conversation, Message};
use crate::routes::{ApiJson, ApiResponse, Envelope, created, done, ok, ok_with_message};
use crate::services::{ChatError, ChatService, MessagePatch, OutgoingMessage};
use crate::state::AppState;

/// GET /conversations
///
/// # Errors
///
/// 500 on store failure.
pub async fn conversations(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<ApiResponse<Vec<Conversation>>> {
    let conversations = ChatService::new(state.store())
        .conversations_for(&caller.uid)
        .await?;
    Ok(ok(conversations))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatroomRequest {
    #[serde(rename = "participantID")]
    pub participant_id: UserId,
}

/// POST /conversations
///
/// An existing chatroom answers 409 and still carries its id, so clients can
/// open it directly.
///
/// # Errors
///
/// 422 without `participantID`, 400 for a self pair, 404 for an unknown user.
pub async fn create_chatroom(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<ChatroomRequest>,
) -> Result<Response> {
    match ChatService::new(state.store())
        .create_chatroom(&caller.uid, &body.participant_id)
        .await
    {
        Ok(id) => Ok(created(
            "Chatroom created successfully",
            json!({ "conversationID": id }),
        )
        .into_response()),
        Err(ChatError::AlreadyExists(id)) => Ok((
            StatusCode::CONFLICT,
            Json(Envelope {
                success: false,
                message: Some("Chatroom already exists".to_string()),
                data: Some(json!({ "conversationID": id })),
            }),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// POST /messages
///
/// # Errors
///
/// 422 for a blank receiver or content, 404 for an unknown receiver.
pub async fn send(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<OutgoingMessage>,
) -> Result<ApiResponse<Value>> {
    let (conversation_id, message) = ChatService::new(state.store())
        .send_message(&caller.uid, body)
        .await?;
    Ok(created(
        "Message sent successfully",
        json!({ "id": message.id, "conversationID": conversation_id }),
    ))
}

/// GET /conversations/{id}/messages
///
/// # Errors
///
/// 404 for an unknown conversation, 403 for outsiders.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<ConversationId>,
) -> Result<ApiResponse<Vec<Message>>> {
    let messages = ChatService::new(state.store())
        .messages(&caller.uid, &id)
        .await?;
    Ok(ok(messages))
}

/// GET /conversations/{id}/messages/{message_id}
///
/// # Errors
///
/// 404 for an unknown conversation or message, 403 for outsiders.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path((id, message_id)): Path<(ConversationId, MessageId)>,
) -> Result<ApiResponse<Message>> {
    let message = ChatService::new(state.store())
        .message(&caller.uid, &id, &message_id)
        .await?;
    Ok(ok(message))
}

/// PUT /conversations/{id}/messages/{message_id}
///
/// # Errors
///
/// 403 when the caller may not change the sent fields.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path((id, message_id)): Path<(ConversationId, MessageId)>,
    ApiJson(patch): ApiJson<MessagePatch>,
) -> Result<ApiResponse<Message>> {
    let message = ChatService::new(state.store())
        .update_message(&caller.uid, &id, &message_id, patch)
        .await?;
    Ok(ok_with_message("Message updated successfully", message))
}

/// DELETE /conversations/{id}/messages/{message_id}
///
/// # Errors
///
/// 403 unless the caller sent the message.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path((id, message_id)): Path<(ConversationId, MessageId)>,
) -> Result<ApiResponse<()>> {
    ChatService::new(state.store())
        .delete_message(&caller.uid, &id, &message_id)
        .await?;
    Ok(done("Message deleted successfully"))
}
