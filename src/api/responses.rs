//! Shared API response types
//!
//! This module contains common response structures used across multiple API
//! endpoints to ensure consistency and reduce code duplication.

use serde::{Deserialize, Serialize};

use crate::models::{AvailabilitySlot, Message, Rating, Session, Skill, UserWithProfile};

// ============================================================================
// Skill and Profile Response Types
// ============================================================================

/// Skill as embedded in catalogs, profiles and sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Profile embedded in user responses
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub bio: String,
    pub skills: Vec<SkillResponse>,
    pub is_mentor: bool,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub availability: Vec<AvailabilitySlot>,
}

/// Full user response with profile
///
/// Used for the caller's own account (`/auth/me`).
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: ProfileResponse,
}

/// Mentor directory response
///
/// Same shape as [`UserResponse`] minus the email, which stays private.
#[derive(Debug, Serialize)]
pub struct MentorResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: ProfileResponse,
}

/// Lightweight user info embedded in sessions, ratings and messages
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub is_mentor: bool,
}

// ============================================================================
// Session, Rating and Message Response Types
// ============================================================================

/// Full session response with embedded participants
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub requester: UserSummary,
    pub mentor: UserSummary,
    pub skill: Option<SkillResponse>,
    pub duration_minutes: i64,
    pub description: String,
    pub status: String,
    pub scheduled_time: Option<String>,
    pub meeting_url: String,
    pub rating: Option<RatingResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Rating response with the rater embedded
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: i64,
    pub session: i64,
    pub rater: UserSummary,
    pub score: i32,
    pub comment: String,
    pub created_at: String,
}

/// Chat message response with the sender embedded
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub session: i64,
    pub sender: UserSummary,
    pub text: String,
    pub timestamp: String,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Skill> for SkillResponse {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name,
            slug: skill.slug,
        }
    }
}

impl From<UserWithProfile> for ProfileResponse {
    fn from(user: UserWithProfile) -> Self {
        Self {
            id: user.profile.id,
            bio: user.profile.bio,
            skills: user.skills.into_iter().map(SkillResponse::from).collect(),
            is_mentor: user.profile.is_mentor,
            rating_avg: user.profile.rating_avg,
            rating_count: user.profile.rating_count,
            availability: user.profile.availability,
        }
    }
}

impl From<UserWithProfile> for UserResponse {
    fn from(user: UserWithProfile) -> Self {
        let id = user.user.id;
        let username = user.user.username.clone();
        let email = user.user.email.clone();
        let first_name = user.user.first_name.clone();
        let last_name = user.user.last_name.clone();
        Self {
            id,
            username,
            email,
            first_name,
            last_name,
            profile: user.into(),
        }
    }
}

impl From<UserWithProfile> for MentorResponse {
    fn from(user: UserWithProfile) -> Self {
        let id = user.user.id;
        let username = user.user.username.clone();
        let first_name = user.user.first_name.clone();
        let last_name = user.user.last_name.clone();
        Self {
            id,
            username,
            first_name,
            last_name,
            profile: user.into(),
        }
    }
}

impl From<UserWithProfile> for UserSummary {
    fn from(user: UserWithProfile) -> Self {
        Self {
            id: user.user.id,
            username: user.user.username,
            first_name: user.user.first_name,
            last_name: user.user.last_name,
            rating_avg: user.profile.rating_avg,
            rating_count: user.profile.rating_count,
            is_mentor: user.profile.is_mentor,
        }
    }
}

impl SessionResponse {
    /// Build the base response from a session and its two participants
    pub fn new(session: Session, requester: UserSummary, mentor: UserSummary) -> Self {
        Self {
            id: session.id,
            requester,
            mentor,
            skill: None,
            duration_minutes: session.duration_minutes.as_minutes(),
            description: session.description,
            status: session.status.to_string(),
            scheduled_time: session.scheduled_time.map(|dt| dt.to_rfc3339()),
            meeting_url: session.meeting_url,
            rating: None,
            created_at: session.created_at.to_rfc3339(),
            updated_at: session.updated_at.to_rfc3339(),
        }
    }

    /// Add the referenced skill to the response
    pub fn with_skill(mut self, skill: Option<Skill>) -> Self {
        self.skill = skill.map(SkillResponse::from);
        self
    }

    /// Add the session's rating to the response
    pub fn with_rating(mut self, rating: Option<RatingResponse>) -> Self {
        self.rating = rating;
        self
    }
}

impl RatingResponse {
    /// Build the response from a rating and its rater
    pub fn new(rating: Rating, rater: UserSummary) -> Self {
        Self {
            id: rating.id,
            session: rating.session_id,
            rater,
            score: rating.score,
            comment: rating.comment,
            created_at: rating.created_at.to_rfc3339(),
        }
    }
}

impl MessageResponse {
    /// Build the response from a message and its sender
    pub fn new(message: Message, sender: UserSummary) -> Self {
        Self {
            id: message.id,
            session: message.session_id,
            sender,
            text: message.text,
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}
