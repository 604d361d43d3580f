//! Rating model
//!
//! A rating is created once per completed session by the session's
//! requester and is immutable thereafter. Creating a rating recomputes the
//! mentor's profile aggregate in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest allowed score
pub const MIN_SCORE: i32 = 1;
/// Highest allowed score
pub const MAX_SCORE: i32 = 5;

/// A score given by a requester for a completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Unique identifier
    pub id: i64,
    /// Rated session (unique, at most one rating per session)
    pub session_id: i64,
    /// User who gave the rating (the session's requester)
    pub rater_id: i64,
    /// Score, 1 through 5
    pub score: i32,
    /// Free-text comment
    pub comment: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Create a new rating
    pub fn new(session_id: i64, rater_id: i64, score: i32, comment: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            session_id,
            rater_id,
            score,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Check that a score lies within the allowed range
pub fn score_in_range(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Input for creating a rating
#[derive(Debug, Clone)]
pub struct CreateRatingInput {
    /// Session being rated
    pub session_id: i64,
    /// Score, 1 through 5
    pub score: i32,
    /// Free-text comment
    pub comment: String,
}
