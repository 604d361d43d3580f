//! Message API endpoints
//!
//! Handles HTTP requests for the session chat:
//! - GET /api/v1/messages?session={id} - List a session's messages
//! - POST /api/v1/messages - Post a message to a session
//!
//! All routes require authentication.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::MessageResponse;

/// Query parameters for listing messages
#[derive(Debug, Deserialize, Default)]
pub struct ListMessagesQuery {
    /// Session to read, required
    pub session: Option<i64>,
}

/// Request body for posting a message
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub session_id: i64,
    pub text: String,
}

/// Build message routes (all require auth middleware)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_messages).post(create_message))
}

/// GET /api/v1/messages?session={id} - List a session's messages
///
/// Non-participants get an empty list, the same as for a session that
/// does not exist.
async fn list_messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = query
        .session
        .ok_or_else(|| ApiError::validation_error("The session query parameter is required"))?;

    let messages = state
        .message_service
        .list(user.0.id, session_id)
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::with_capacity(messages.len());
    for message in messages {
        let sender = state
            .user_service
            .get_current(message.sender_id)
            .await
            .map_err(ApiError::from)?;
        responses.push(MessageResponse::new(message, sender.into()));
    }
    Ok(Json(responses))
}

/// POST /api/v1/messages - Post a message
async fn create_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .message_service
        .create(user.0.id, body.session_id, &body.text)
        .await
        .map_err(ApiError::from)?;

    let sender = state
        .user_service
        .get_current(user.0.id)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(message, sender.into())),
    ))
}
