//! Mentoring session API endpoints
//!
//! Handles HTTP requests for the session lifecycle:
//! - GET /api/v1/sessions - List the caller's sessions
//! - POST /api/v1/sessions - Request a session (idempotent via X-Idempotency-Key)
//! - GET /api/v1/sessions/{id} - Get a single session
//! - PATCH /api/v1/sessions/{id} - Update session details (mentor only)
//! - POST /api/v1/sessions/{id}/accept - Accept a requested session
//! - POST /api/v1/sessions/{id}/complete - Mark an accepted session completed
//! - POST /api/v1/sessions/{id}/cancel - Cancel a pending session
//!
//! All routes require authentication.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{RatingResponse, SessionResponse};
use crate::models::{
    CreateSessionInput, Session, SessionDuration, SessionStatus, SessionWindow,
    UpdateSessionInput,
};
use crate::services::SkillServiceError;

/// Header carrying the client-chosen idempotency key for session creation
const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

/// Request body for creating a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub mentor_id: i64,
    pub skill_id: Option<i64>,
    /// Length in minutes, defaults to 30 when omitted
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub description: String,
    pub scheduled_time: Option<String>,
}

/// Query parameters for listing sessions
#[derive(Debug, Deserialize, Default)]
pub struct ListSessionsQuery {
    /// Exact status filter (requested, accepted, completed, cancelled)
    pub status: Option<String>,
    /// Coarse filter: "upcoming" or "past"
    #[serde(rename = "type")]
    pub window: Option<String>,
}

/// Request body for updating a session
#[derive(Debug, Deserialize, Default)]
pub struct UpdateSessionRequest {
    pub skill_id: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub description: Option<String>,
    pub scheduled_time: Option<String>,
    pub meeting_url: Option<String>,
}

/// Build session routes (all require auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions).post(create_session))
        .route("/{id}", get(get_session).patch(update_session))
        .route("/{id}/accept", post(accept_session))
        .route("/{id}/complete", post(complete_session))
        .route("/{id}/cancel", post(cancel_session))
}

/// GET /api/v1/sessions - List the caller's sessions
///
/// Returns sessions where the caller is requester or mentor, newest
/// first.
async fn list_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<SessionStatus>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;
    let window = query
        .window
        .as_deref()
        .map(|s| s.parse::<SessionWindow>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let sessions = state
        .session_service
        .list(user.0.id, status, window)
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::with_capacity(sessions.len());
    for session in sessions {
        responses.push(build_session_response(&state, session).await?);
    }
    Ok(Json(responses))
}

/// POST /api/v1/sessions - Request a session
///
/// A client may replay the request with the same `X-Idempotency-Key`
/// header and get the originally created session back.
async fn create_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let duration = SessionDuration::try_from(body.duration_minutes.unwrap_or(30))
        .map_err(ApiError::validation_error)?;

    let scheduled_time = body
        .scheduled_time
        .as_deref()
        .map(|raw| state.session_service.normalize_scheduled_time(raw))
        .transpose()
        .map_err(ApiError::from)?;

    let input = CreateSessionInput {
        mentor_id: body.mentor_id,
        skill_id: body.skill_id,
        duration_minutes: duration,
        description: body.description,
        scheduled_time,
        idempotency_key,
    };

    let session = state
        .session_service
        .create(user.0.id, input)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/sessions/{id} - Get a single session
///
/// Non-participants get a 404, indistinguishable from a missing row.
async fn get_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .session_service
        .get(user.0.id, id)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok(Json(response))
}

/// PATCH /api/v1/sessions/{id} - Update session details
///
/// Only the mentor may update, and status is never writable here.
async fn update_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let duration = body
        .duration_minutes
        .map(SessionDuration::try_from)
        .transpose()
        .map_err(ApiError::validation_error)?;

    let scheduled_time = body
        .scheduled_time
        .as_deref()
        .map(|raw| state.session_service.normalize_scheduled_time(raw))
        .transpose()
        .map_err(ApiError::from)?;

    let input = UpdateSessionInput {
        skill_id: body.skill_id,
        duration_minutes: duration,
        description: body.description,
        scheduled_time,
        meeting_url: body.meeting_url,
    };

    let session = state
        .session_service
        .update(user.0.id, id, input)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok(Json(response))
}

/// POST /api/v1/sessions/{id}/accept - Accept a requested session
async fn accept_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .session_service
        .accept(user.0.id, id)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok(Json(response))
}

/// POST /api/v1/sessions/{id}/complete - Mark a session completed
async fn complete_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .session_service
        .complete(user.0.id, id)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok(Json(response))
}

/// POST /api/v1/sessions/{id}/cancel - Cancel a session
async fn cancel_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .session_service
        .cancel(user.0.id, id)
        .await
        .map_err(ApiError::from)?;

    let response = build_session_response(&state, session).await?;
    Ok(Json(response))
}

/// Assemble the full session payload with participant summaries, the
/// referenced skill and any attached rating.
async fn build_session_response(
    state: &AppState,
    session: Session,
) -> Result<SessionResponse, ApiError> {
    let requester = state
        .user_service
        .get_current(session.requester_id)
        .await
        .map_err(ApiError::from)?;
    let mentor = state
        .user_service
        .get_current(session.mentor_id)
        .await
        .map_err(ApiError::from)?;

    // A dangling skill reference renders as null rather than failing
    // the whole payload
    let skill = match session.skill_id {
        Some(skill_id) => match state.skill_service.get(skill_id).await {
            Ok(skill) => Some(skill),
            Err(SkillServiceError::NotFound(_)) => None,
            Err(e) => return Err(ApiError::from(e)),
        },
        None => None,
    };

    let rating = match state
        .rating_service
        .get_by_session(session.id)
        .await
        .map_err(ApiError::from)?
    {
        Some(rating) => {
            let rater = state
                .user_service
                .get_current(rating.rater_id)
                .await
                .map_err(ApiError::from)?;
            Some(RatingResponse::new(rating, rater.into()))
        }
        None => None,
    };

    Ok(SessionResponse::new(session, requester.into(), mentor.into())
        .with_skill(skill)
        .with_rating(rating))
}
