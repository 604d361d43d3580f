//! Authentication API endpoints
//!
//! Handles HTTP requests for accounts and identity:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user with profile
//! - PATCH /api/v1/auth/me - Update current user and profile

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{AvailabilitySlot, CreateUserInput, UpdateProfileInput, UpdateUserInput};
use crate::services::LoginInput;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Optional confirmation field, validated against `password` when present
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Request body for updating the current user
///
/// All fields are optional. Account fields and profile fields may be
/// mixed freely in one request.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub is_mentor: Option<bool>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub skill_ids: Option<Vec<i64>>,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user).patch(update_current_user))
}

/// POST /api/v1/auth/register - User registration
///
/// Creates the account and its empty profile. Does not log the new
/// user in; clients call login separately.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(password2) = &body.password2 {
        if *password2 != body.password {
            return Err(ApiError::validation_error("Password fields didn't match."));
        }
    }

    let input = CreateUserInput {
        username: body.username,
        email: body.email,
        password: body.password,
        first_name: body.first_name.unwrap_or_default(),
        last_name: body.last_name.unwrap_or_default(),
    };

    let user = state
        .user_service
        .register(input)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login - User login
///
/// Issues a bearer token and mirrors it into an httpOnly session cookie.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = LoginInput::new(&body.username_or_email, &body.password);
    let token = state.user_service.login(input).await.map_err(ApiError::from)?;

    let user = state
        .user_service
        .get_current(token.user_id)
        .await
        .map_err(ApiError::from)?;

    let max_age = state.config.auth.token_expiration_days * 24 * 60 * 60;
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token.id, max_age
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());

    Ok((
        response_headers,
        Json(AuthResponse {
            user: user.into(),
            token: token.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - User logout
///
/// Requires authentication.
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Extract token from cookie or Authorization header
    let token = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            s.split(';')
                .find(|c| c.trim().starts_with("session="))
                .map(|c| c.trim().strip_prefix("session=").unwrap_or(""))
        })
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state
        .user_service
        .logout(token)
        .await
        .map_err(ApiError::from)?;

    // Clear the session cookie
    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Get current user
///
/// Requires authentication.
async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let current = state
        .user_service
        .get_current(user.0.id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(current)))
}

/// PATCH /api/v1/auth/me - Update current user
///
/// Requires authentication. Account fields and profile fields are
/// split and applied through the user service in one call.
async fn update_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_input = UpdateUserInput {
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
    };
    let profile_input = UpdateProfileInput {
        bio: body.bio,
        is_mentor: body.is_mentor,
        availability: body.availability,
        skill_ids: body.skill_ids,
    };

    let updated = state
        .user_service
        .update_current(user.0.id, user_input, profile_input)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UserResponse::from(updated)))
}
