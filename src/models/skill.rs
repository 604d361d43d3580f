//! Skill model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A skill that can be taught or learned.
///
/// Skills are referenced by profiles (many-to-many) and by sessions
/// (optionally). There is no update path once a skill exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier
    pub id: i64,
    /// Skill name (unique)
    pub name: String,
    /// URL-friendly slug (unique, generated from the name)
    pub slug: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Skill {
    /// Create a new skill
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            name,
            slug,
            created_at: Utc::now(),
        }
    }
}
