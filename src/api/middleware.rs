//! API middleware
//!
//! Contains middleware for:
//! - Authentication (bearer token or session cookie validation)
//! - The shared application state
//! - The error envelope and service error mapping

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::models::User;
use crate::services::{
    MentorService, MentorServiceError, MessageService, MessageServiceError, RatingService,
    RatingServiceError, SessionService, SessionServiceError, SkillService, SkillServiceError,
    UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub skill_service: Arc<SkillService>,
    pub mentor_service: Arc<MentorService>,
    pub session_service: Arc<SessionService>,
    pub rating_service: Arc<RatingService>,
    pub message_service: Arc<MessageService>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new("INVALID_STATE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "INVALID_STATE" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Log an infrastructure failure and hide its details from the client
fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("Internal error: {:#}", err);
    ApiError::internal_error("Internal server error")
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SkillServiceError> for ApiError {
    fn from(err: SkillServiceError) -> Self {
        match err {
            SkillServiceError::NotFound(msg) => ApiError::not_found(msg),
            SkillServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SkillServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<MentorServiceError> for ApiError {
    fn from(err: MentorServiceError) -> Self {
        match err {
            MentorServiceError::NotFound(msg) => ApiError::not_found(msg),
            MentorServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::NotFound(msg) => ApiError::not_found(msg),
            SessionServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SessionServiceError::AuthorizationError(msg) => ApiError::forbidden(msg),
            SessionServiceError::InvalidStateError(msg) => ApiError::invalid_state(msg),
            SessionServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<RatingServiceError> for ApiError {
    fn from(err: RatingServiceError) -> Self {
        match err {
            RatingServiceError::NotFound(msg) => ApiError::not_found(msg),
            RatingServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            RatingServiceError::AuthorizationError(msg) => ApiError::forbidden(msg),
            RatingServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<MessageServiceError> for ApiError {
    fn from(err: MessageServiceError) -> Self {
        match err {
            MessageServiceError::NotFound(msg) => ApiError::not_found(msg),
            MessageServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            MessageServiceError::AuthorizationError(msg) => ApiError::forbidden(msg),
            MessageServiceError::InternalError(e) => internal(e),
        }
    }
}

/// Extract session token from request
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_token(&token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// ============================================================================
// Tests
// ============================================================================
