//! Mentor service
//!
//! Implements the mentor directory:
//! - Listing mentors ordered by rating with optional skill and search filters
//! - Fetching a single mentor's public profile
//!
//! A user appears in the directory only while their profile has the mentor
//! flag set.

use crate::db::repositories::UserRepository;
use crate::models::{MentorFilter, UserWithProfile};
use anyhow::Context;
use std::sync::Arc;

/// Error types for mentor service operations
#[derive(Debug, thiserror::Error)]
pub enum MentorServiceError {
    /// Mentor not found
    #[error("Mentor not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Mentor service for browsing the mentor directory
pub struct MentorService {
    user_repo: Arc<dyn UserRepository>,
}

impl MentorService {
    /// Create a new mentor service
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// List mentors ordered by rating average (descending), then username
    ///
    /// Filters in `filter` narrow the result by skill, availability, or a
    /// case-insensitive search over username and full name.
    pub async fn list(
        &self,
        filter: &MentorFilter,
    ) -> Result<Vec<UserWithProfile>, MentorServiceError> {
        self.user_repo
            .list_mentors(filter)
            .await
            .context("Failed to list mentors")
            .map_err(Into::into)
    }

    /// Get a single mentor by user ID
    ///
    /// # Errors
    /// - `NotFound` if the user does not exist or is not a mentor
    pub async fn get(&self, user_id: i64) -> Result<UserWithProfile, MentorServiceError> {
        let mentor = self
            .user_repo
            .get_with_profile(user_id)
            .await
            .context("Failed to get mentor")?
            .ok_or_else(|| {
                MentorServiceError::NotFound(format!("Mentor with ID {} not found", user_id))
            })?;

        // Non-mentors are invisible here even though the user exists
        if !mentor.profile.is_mentor {
            return Err(MentorServiceError::NotFound(format!(
                "Mentor with ID {} not found",
                user_id
            )));
        }

        Ok(mentor)
    }
}
