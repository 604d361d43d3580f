//! User model
//!
//! This module defines the User entity and related types for the SkillSync
//! service. Every user owns exactly one profile (see `Profile`), created in
//! the same transaction as the user row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Profile, Skill};

/// User entity representing a registered account.
///
/// A user may act as a learner (requesting sessions), as a mentor
/// (when their profile carries the mentor flag), or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this
    /// function. Use `services::password::hash_password()` to hash it.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user together with their profile and declared skills.
///
/// This is the shape returned by the current-user endpoint and by the
/// mentor directory.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
    /// The user account
    pub user: User,
    /// The user's profile
    pub profile: Profile,
    /// Skills declared on the profile
    pub skills: Vec<Skill>,
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// Input for updating the account fields of a user
///
/// Profile fields are updated separately, see `UpdateProfileInput`.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New email (optional)
    pub email: Option<String>,
    /// New given name (optional)
    pub first_name: Option<String>,
    /// New family name (optional)
    pub last_name: Option<String>,
}

impl UpdateUserInput {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}
