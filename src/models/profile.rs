//! Profile model
//!
//! Every user owns exactly one profile. The profile carries the mentor flag,
//! the declared skills, weekly availability windows, and the derived rating
//! aggregate (`rating_avg` / `rating_count`).
//!
//! The rating aggregate is never written directly: it is recomputed from
//! completed, rated sessions whenever a new rating lands (see
//! `RatingRepository::create_and_recompute`).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile entity extending a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier
    pub id: i64,
    /// Owning user (unique, one profile per user)
    pub user_id: i64,
    /// Free-text biography
    pub bio: String,
    /// Whether this user accepts session requests
    pub is_mentor: bool,
    /// Mean score over completed, rated sessions (derived)
    pub rating_avg: f64,
    /// Number of ratings backing `rating_avg` (derived)
    pub rating_count: i64,
    /// Weekly availability windows
    pub availability: Vec<AvailabilitySlot>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile for a freshly registered user
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            user_id,
            bio: String::new(),
            is_mentor: false,
            rating_avg: 0.0,
            rating_count: 0,
            availability: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialize the availability windows for storage
    pub fn availability_json(&self) -> Result<String> {
        serde_json::to_string(&self.availability).context("Failed to serialize availability")
    }
}

/// A weekly availability window.
///
/// `day` is 0 = Monday through 6 = Sunday; `start` and `end` are wall-clock
/// times in "HH:MM" format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Weekday, 0 = Monday through 6 = Sunday
    pub day: u8,
    /// Window start, "HH:MM"
    pub start: String,
    /// Window end, "HH:MM"
    pub end: String,
}

impl AvailabilitySlot {
    /// Validate the weekday range and time format
    pub fn validate(&self) -> Result<()> {
        if self.day > 6 {
            anyhow::bail!("Availability day must be between 0 and 6, got {}", self.day);
        }
        validate_time(&self.start)
            .with_context(|| format!("Invalid availability start time: {}", self.start))?;
        validate_time(&self.end)
            .with_context(|| format!("Invalid availability end time: {}", self.end))?;
        Ok(())
    }
}

fn validate_time(value: &str) -> Result<()> {
    let (hours, minutes) = value
        .split_once(':')
        .context("Time must be in HH:MM format")?;
    let hours: u32 = hours.parse().context("Time hours must be numeric")?;
    let minutes: u32 = minutes.parse().context("Time minutes must be numeric")?;
    if hours > 23 || minutes > 59 {
        anyhow::bail!("Time out of range: {}", value);
    }
    Ok(())
}

/// Parse availability windows from their storage representation
pub fn parse_availability(json: &str) -> Result<Vec<AvailabilitySlot>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).context("Failed to parse availability")
}

/// Filters accepted by the mentor directory listing.
///
/// All filters combine with AND. Text filters match case-insensitively on
/// substrings.
#[derive(Debug, Clone, Default)]
pub struct MentorFilter {
    /// Match mentors declaring a skill whose name contains this text
    pub skill: Option<String>,
    /// Match mentors declaring this exact skill
    pub skill_id: Option<i64>,
    /// Only mentors with at least one availability window
    pub available: bool,
    /// Match username, first name, or last name
    pub search: Option<String>,
}

/// Input for updating profile fields
///
/// All fields are optional; `None` leaves the current value unchanged.
/// `skill_ids` replaces the whole declared skill set when present.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New biography (optional)
    pub bio: Option<String>,
    /// New mentor flag (optional)
    pub is_mentor: Option<bool>,
    /// New availability windows (optional)
    pub availability: Option<Vec<AvailabilitySlot>>,
    /// Replacement skill set (optional)
    pub skill_ids: Option<Vec<i64>>,
}

impl UpdateProfileInput {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.bio.is_none()
            && self.is_mentor.is_none()
            && self.availability.is_none()
            && self.skill_ids.is_none()
    }
}
