//! Mentor directory API endpoints
//!
//! Handles HTTP requests for browsing mentors:
//! - GET /api/v1/mentors - List mentors with optional filters
//! - GET /api/v1/mentors/{id} - Get a single mentor

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::MentorResponse;
use crate::models::MentorFilter;

/// Query parameters for listing mentors
#[derive(Debug, Deserialize, Default)]
pub struct ListMentorsQuery {
    /// Case-insensitive substring match on declared skill names
    pub skill: Option<String>,
    /// Exact skill ID match
    pub skill_id: Option<i64>,
    /// Any non-empty value restricts to mentors with availability slots
    pub available: Option<String>,
    /// Substring match on username or real name
    pub search: Option<String>,
}

impl From<ListMentorsQuery> for MentorFilter {
    fn from(query: ListMentorsQuery) -> Self {
        MentorFilter {
            skill: query.skill,
            skill_id: query.skill_id,
            available: query.available.as_deref().is_some_and(|v| !v.is_empty()),
            search: query.search,
        }
    }
}

/// Build mentor routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_mentors))
        .route("/{id}", get(get_mentor))
}

/// GET /api/v1/mentors - List mentors
///
/// Ordered by average rating (best first), then username.
async fn list_mentors(
    State(state): State<AppState>,
    Query(query): Query<ListMentorsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mentors = state
        .mentor_service
        .list(&query.into())
        .await
        .map_err(ApiError::from)?;

    let responses: Vec<MentorResponse> = mentors.into_iter().map(MentorResponse::from).collect();
    Ok(Json(responses))
}

/// GET /api/v1/mentors/{id} - Get a single mentor
///
/// Users who exist but are not mentors are reported as not found.
async fn get_mentor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mentor = state.mentor_service.get(id).await.map_err(ApiError::from)?;
    Ok(Json(MentorResponse::from(mentor)))
}
