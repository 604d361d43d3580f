//! Skill catalog API endpoints
//!
//! Handles HTTP requests for the skill catalog:
//! - GET /api/v1/skills - List skills with optional substring search
//! - GET /api/v1/skills/{id} - Get a single skill

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::SkillResponse;

/// Query parameters for listing skills
#[derive(Debug, Deserialize, Default)]
pub struct ListSkillsQuery {
    /// Case-insensitive substring match on the skill name
    pub search: Option<String>,
}

/// Build skill routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_skills))
        .route("/{id}", get(get_skill))
}

/// GET /api/v1/skills - List skills
async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<ListSkillsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = state
        .skill_service
        .list(query.search.as_deref())
        .await
        .map_err(ApiError::from)?;

    let responses: Vec<SkillResponse> = skills.into_iter().map(SkillResponse::from).collect();
    Ok(Json(responses))
}

/// GET /api/v1/skills/{id} - Get a single skill
async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skill_service.get(id).await.map_err(ApiError::from)?;
    Ok(Json(SkillResponse::from(skill)))
}
