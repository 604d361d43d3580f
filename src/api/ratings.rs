//! Rating API endpoints
//!
//! Handles HTTP requests for session ratings:
//! - GET /api/v1/ratings - List ratings, optionally for one mentor
//! - POST /api/v1/ratings - Rate a completed session
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
use crate::api::responses::RatingResponse;
use crate::models::CreateRatingInput;

/// Query parameters for listing ratings
#[derive(Debug, Deserialize, Default)]
pub struct ListRatingsQuery {
    /// Restrict to ratings received by this mentor
    pub mentor_id: Option<i64>,
}

/// Request body for creating a rating
#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub session_id: i64,
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

/// Build rating routes (all require auth middleware)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_ratings).post(create_rating))
}

/// GET /api/v1/ratings - List ratings, newest first
async fn list_ratings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListRatingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ratings = state
        .rating_service
        .list(query.mentor_id)
        .await
        .map_err(ApiError::from)?;

    let mut responses = Vec::with_capacity(ratings.len());
    for rating in ratings {
        let rater = state
            .user_service
            .get_current(rating.rater_id)
            .await
            .map_err(ApiError::from)?;
        responses.push(RatingResponse::new(rating, rater.into()));
    }
    Ok(Json(responses))
}

/// POST /api/v1/ratings - Rate a completed session
///
/// Only the requester of a completed, not-yet-rated session may rate
/// it. The mentor's aggregate is recomputed in the same transaction.
async fn create_rating(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateRatingInput {
        session_id: body.session_id,
        score: body.score,
        comment: body.comment,
    };

    let rating = state
        .rating_service
        .create(user.0.id, input)
        .await
        .map_err(ApiError::from)?;

    let rater = state
        .user_service
        .get_current(rating.rater_id)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse::new(rating, rater.into())),
    ))
}
