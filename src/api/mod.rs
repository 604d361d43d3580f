//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the SkillSync service.
//! It includes:
//! - Auth API endpoints (register, login, logout, current user)
//! - Skill catalog API endpoints
//! - Mentor directory API endpoints
//! - Session lifecycle API endpoints
//! - Rating API endpoints
//! - Message API endpoints

pub mod auth;
pub mod mentors;
pub mod messages;
pub mod middleware;
pub mod ratings;
pub mod responses;
pub mod sessions;
pub mod skills;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need auth)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/sessions", sessions::router())
        .nest("/ratings", ratings::router())
        .nest("/messages", messages::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/skills", skills::router())
        .nest("/mentors", mentors::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::COOKIE,
            HeaderName::from_static("x-idempotency-key"),
        ])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
