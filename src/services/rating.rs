//! Rating service
//!
//! Implements rating creation for completed sessions:
//! - One rating per session, given by the session's requester
//! - Score bounds checking
//! - Mentor aggregate recompute in the same transaction as the insert
//!
//! Ratings are immutable once created.

use crate::db::repositories::{RatingRepository, SessionRepository};
use crate::models::{
    score_in_range, CreateRatingInput, Rating, SessionStatus, MAX_SCORE, MIN_SCORE,
};
use anyhow::Context;
use std::sync::Arc;

/// Error types for rating service operations
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller is not allowed to perform this operation
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Rating service for scoring completed sessions
pub struct RatingService {
    rating_repo: Arc<dyn RatingRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl RatingService {
    /// Create a new rating service
    pub fn new(
        rating_repo: Arc<dyn RatingRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            rating_repo,
            session_repo,
        }
    }

    /// Rate a completed session
    ///
    /// The insert and the mentor aggregate recompute run in one
    /// transaction.
    ///
    /// # Errors
    /// - `NotFound` if the session does not exist
    /// - `ValidationError` if the session is not completed, is already
    ///   rated, or the score is out of range
    /// - `AuthorizationError` if the caller is not the session's requester
    pub async fn create(
        &self,
        caller_id: i64,
        input: CreateRatingInput,
    ) -> Result<Rating, RatingServiceError> {
        let session = self
            .session_repo
            .get_by_id(input.session_id)
            .await
            .context("Failed to get session")?
            .ok_or_else(|| {
                RatingServiceError::NotFound(format!(
                    "Session with ID {} not found",
                    input.session_id
                ))
            })?;

        if session.status != SessionStatus::Completed {
            return Err(RatingServiceError::ValidationError(
                "Only completed sessions can be rated".to_string(),
            ));
        }

        if self
            .rating_repo
            .get_by_session_id(session.id)
            .await
            .context("Failed to check existing rating")?
            .is_some()
        {
            return Err(RatingServiceError::ValidationError(format!(
                "Session {} has already been rated",
                session.id
            )));
        }

        if caller_id != session.requester_id {
            return Err(RatingServiceError::AuthorizationError(
                "Only the requester can rate a session".to_string(),
            ));
        }

        if !score_in_range(input.score) {
            return Err(RatingServiceError::ValidationError(format!(
                "Score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }

        let rating = Rating::new(session.id, caller_id, input.score, input.comment);
        self.rating_repo
            .create_and_recompute(&rating, session.mentor_id)
            .await
            .context("Failed to create rating")
            .map_err(Into::into)
    }

    /// List ratings, newest first, optionally restricted to one mentor
    pub async fn list(&self, mentor_id: Option<i64>) -> Result<Vec<Rating>, RatingServiceError> {
        self.rating_repo
            .list(mentor_id)
            .await
            .context("Failed to list ratings")
            .map_err(Into::into)
    }

    /// Get the rating attached to a session, if any
    pub async fn get_by_session(
        &self,
        session_id: i64,
    ) -> Result<Option<Rating>, RatingServiceError> {
        self.rating_repo
            .get_by_session_id(session_id)
            .await
            .context("Failed to get rating")
            .map_err(Into::into)
    }
}
