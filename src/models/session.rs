//! Mentoring session model
//!
//! This module defines the Session entity, its lifecycle state machine, and
//! the fixed set of allowed durations.
//!
//! Lifecycle: `requested` (initial) -> `accepted` -> `completed` (terminal),
//! and `requested`/`accepted` -> `cancelled` (terminal). There is no
//! transition out of a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mentoring engagement between a requester and a mentor.
///
/// The status field only ever moves through the lifecycle above; field
/// updates (description, schedule, meeting link) never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: i64,
    /// User who requested the session
    pub requester_id: i64,
    /// Mentor the session was requested from
    pub mentor_id: i64,
    /// Skill the session is about (optional)
    pub skill_id: Option<i64>,
    /// Session length
    pub duration_minutes: SessionDuration,
    /// What the requester wants to cover
    pub description: String,
    /// Lifecycle state
    pub status: SessionStatus,
    /// Agreed start time (optional, strictly future at creation)
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Video call link
    pub meeting_url: String,
    /// Client-supplied key preventing duplicate creation (unique when present)
    pub idempotency_key: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session request in the initial state
    pub fn new(requester_id: i64, input: CreateSessionInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            requester_id,
            mentor_id: input.mentor_id,
            skill_id: input.skill_id,
            duration_minutes: input.duration_minutes,
            description: input.description,
            status: SessionStatus::Requested,
            scheduled_time: input.scheduled_time,
            meeting_url: String::new(),
            idempotency_key: input.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the given user is the requester or the mentor
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.requester_id == user_id || self.mentor_id == user_id
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for the mentor to accept
    Requested,
    /// Accepted by the mentor, not yet held
    Accepted,
    /// Held and finished (terminal)
    Completed,
    /// Called off by a participant (terminal)
    Cancelled,
}

impl SessionStatus {
    /// Check if this state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Requested
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Requested => write!(f, "requested"),
            SessionStatus::Accepted => write!(f, "accepted"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(SessionStatus::Requested),
            "accepted" => Ok(SessionStatus::Accepted),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid session status: {}", s)),
        }
    }
}

/// Coarse lifecycle filter for session listings.
///
/// `Upcoming` covers sessions still in motion (requested or accepted),
/// `Past` covers the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionWindow {
    /// Requested or accepted
    Upcoming,
    /// Completed or cancelled
    Past,
}

impl SessionWindow {
    /// The statuses included in this window
    pub fn statuses(&self) -> [SessionStatus; 2] {
        match self {
            SessionWindow::Upcoming => [SessionStatus::Requested, SessionStatus::Accepted],
            SessionWindow::Past => [SessionStatus::Completed, SessionStatus::Cancelled],
        }
    }
}

impl FromStr for SessionWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(SessionWindow::Upcoming),
            "past" => Ok(SessionWindow::Past),
            _ => Err(anyhow::anyhow!("Invalid session filter: {}", s)),
        }
    }
}

/// Allowed session lengths.
///
/// Serialized as the raw minute count (15/30/45/60) in both JSON and the
/// database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum SessionDuration {
    /// Quarter hour
    Min15,
    /// Half hour (default)
    Min30,
    /// Three quarters of an hour
    Min45,
    /// Full hour
    Min60,
}

impl SessionDuration {
    /// The duration in minutes
    pub fn as_minutes(&self) -> i64 {
        match self {
            SessionDuration::Min15 => 15,
            SessionDuration::Min30 => 30,
            SessionDuration::Min45 => 45,
            SessionDuration::Min60 => 60,
        }
    }
}

impl Default for SessionDuration {
    fn default() -> Self {
        Self::Min30
    }
}

impl From<SessionDuration> for i64 {
    fn from(duration: SessionDuration) -> Self {
        duration.as_minutes()
    }
}

impl TryFrom<i64> for SessionDuration {
    type Error = String;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        match minutes {
            15 => Ok(SessionDuration::Min15),
            30 => Ok(SessionDuration::Min30),
            45 => Ok(SessionDuration::Min45),
            60 => Ok(SessionDuration::Min60),
            _ => Err(format!(
                "Invalid session duration: {} (allowed: 15, 30, 45, 60)",
                minutes
            )),
        }
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_minutes())
    }
}

/// Input for creating a session request
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    /// Mentor to request the session from
    pub mentor_id: i64,
    /// Skill the session is about (optional)
    pub skill_id: Option<i64>,
    /// Session length
    pub duration_minutes: SessionDuration,
    /// What the requester wants to cover
    pub description: String,
    /// Agreed start time (optional)
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Client-supplied idempotency key (optional)
    pub idempotency_key: Option<String>,
}

/// Input for updating session fields.
///
/// All fields are optional; `None` leaves the current value unchanged. The
/// lifecycle state is deliberately absent: it only moves through the
/// accept/complete/cancel operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateSessionInput {
    /// New skill reference (optional)
    pub skill_id: Option<i64>,
    /// New session length (optional)
    pub duration_minutes: Option<SessionDuration>,
    /// New description (optional)
    pub description: Option<String>,
    /// New start time (optional)
    pub scheduled_time: Option<DateTime<Utc>>,
    /// New meeting link (optional)
    pub meeting_url: Option<String>,
}

impl UpdateSessionInput {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.skill_id.is_none()
            && self.duration_minutes.is_none()
            && self.description.is_none()
            && self.scheduled_time.is_none()
            && self.meeting_url.is_none()
    }
}
