//! User service
//!
//! Implements business logic for accounts and authentication:
//! - Registration (user + empty profile created atomically)
//! - Login / logout with opaque bearer tokens
//! - Token validation for the auth middleware
//! - Current-user reads and partial account/profile updates

use crate::db::repositories::{AuthTokenRepository, SkillRepository, UserRepository};
use crate::models::{
    AuthToken, CreateUserInput, UpdateProfileInput, UpdateUserInput, User, UserWithProfile,
};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default bearer token lifetime in days
const DEFAULT_TOKEN_EXPIRATION_DAYS: i64 = 7;

/// Username length bounds
const USERNAME_MIN_LENGTH: usize = 3;
const USERNAME_MAX_LENGTH: usize = 50;

/// Minimum password length
const PASSWORD_MIN_LENGTH: usize = 8;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    token_repo: Arc<dyn AuthTokenRepository>,
    skill_repo: Arc<dyn SkillRepository>,
    token_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn AuthTokenRepository>,
        skill_repo: Arc<dyn SkillRepository>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            skill_repo,
            token_expiration_days: DEFAULT_TOKEN_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom token expiration
    pub fn with_token_expiration(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn AuthTokenRepository>,
        skill_repo: Arc<dyn SkillRepository>,
        token_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            skill_repo,
            token_expiration_days,
        }
    }

    /// Register a new user
    ///
    /// Creates the user and their empty profile together, so an account
    /// never exists without a profile.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if a field is malformed or username/email is taken
    /// - `InternalError` for database errors
    pub async fn register(
        &self,
        input: CreateUserInput,
    ) -> Result<UserWithProfile, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::ValidationError(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(
            input.username,
            input.email,
            password_hash,
            input.first_name,
            input.last_name,
        );

        let (user, profile) = self
            .user_repo
            .create_with_profile(&user)
            .await
            .context("Failed to create user")?;

        Ok(UserWithProfile {
            user,
            profile,
            skills: Vec::new(),
        })
    }

    /// Login with credentials
    ///
    /// Accepts a username or an email address. On success issues a fresh
    /// bearer token with the configured expiry.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` for an unknown user or a wrong password
    ///   (the two cases are indistinguishable)
    /// - `InternalError` for database errors
    pub async fn login(&self, input: LoginInput) -> Result<AuthToken, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        self.issue_token(user.id).await
    }

    /// Logout (invalidate a bearer token)
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.token_repo
            .delete(token)
            .await
            .context("Failed to delete auth token")?;

        Ok(())
    }

    /// Validate a bearer token and return the associated user
    ///
    /// Returns `None` when the token does not exist or has expired; expired
    /// tokens are deleted on sight.
    pub async fn validate_token(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let stored = match self
            .token_repo
            .get_by_id(token)
            .await
            .context("Failed to get auth token")?
        {
            Some(t) => t,
            None => return Ok(None),
        };

        if stored.is_expired() {
            // Clean up the stale row
            let _ = self.token_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(stored.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get a user together with their profile and skills
    pub async fn get_current(&self, user_id: i64) -> Result<UserWithProfile, UserServiceError> {
        let user = self
            .user_repo
            .get_with_profile(user_id)
            .await
            .context("Failed to get user with profile")?
            .ok_or(UserServiceError::NotFound)?;

        Ok(user)
    }

    /// Partially update the caller's account and profile
    ///
    /// Account fields (email, first/last name) and profile fields (bio,
    /// mentor flag, availability, skill set) may change in one call. The
    /// rating aggregate is not writable here.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `ValidationError` for a malformed email, a taken email, an invalid
    ///   availability window, or an unknown skill id
    /// - `InternalError` for database errors
    pub async fn update_current(
        &self,
        user_id: i64,
        user_input: UpdateUserInput,
        profile_input: UpdateProfileInput,
    ) -> Result<UserWithProfile, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        if !user_input.is_empty() {
            if let Some(email) = user_input.email {
                self.validate_new_email(&email, user_id).await?;
                user.email = email;
            }
            if let Some(first_name) = user_input.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = user_input.last_name {
                user.last_name = last_name;
            }
            self.user_repo
                .update(&user)
                .await
                .context("Failed to update user")?;
        }

        let mut profile = self
            .user_repo
            .get_profile_by_user_id(user_id)
            .await
            .context("Failed to get profile")?
            .context("Profile missing for user")?;

        if let Some(availability) = &profile_input.availability {
            for slot in availability {
                slot.validate()
                    .map_err(|e| UserServiceError::ValidationError(e.to_string()))?;
            }
        }

        let mut profile_changed = false;
        if let Some(bio) = profile_input.bio {
            profile.bio = bio;
            profile_changed = true;
        }
        if let Some(is_mentor) = profile_input.is_mentor {
            profile.is_mentor = is_mentor;
            profile_changed = true;
        }
        if let Some(availability) = profile_input.availability {
            profile.availability = availability;
            profile_changed = true;
        }
        if profile_changed {
            self.user_repo
                .update_profile(&profile)
                .await
                .context("Failed to update profile")?;
        }

        if let Some(skill_ids) = profile_input.skill_ids {
            for skill_id in &skill_ids {
                if self
                    .skill_repo
                    .get_by_id(*skill_id)
                    .await
                    .context("Failed to check skill")?
                    .is_none()
                {
                    return Err(UserServiceError::ValidationError(format!(
                        "Skill {} does not exist",
                        skill_id
                    )));
                }
            }
            self.user_repo
                .set_profile_skills(profile.id, &skill_ids)
                .await
                .context("Failed to update profile skills")?;
        }

        self.get_current(user_id).await
    }

    /// Delete all expired tokens
    ///
    /// Maintenance operation; returns the number of tokens deleted.
    pub async fn cleanup_expired_tokens(&self) -> Result<i64, UserServiceError> {
        let count = self
            .token_repo
            .delete_expired()
            .await
            .context("Failed to delete expired tokens")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    /// Validate registration input
    fn validate_register_input(&self, input: &CreateUserInput) -> Result<(), UserServiceError> {
        let username = input.username.trim();
        if username.len() < USERNAME_MIN_LENGTH || username.len() > USERNAME_MAX_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH
            )));
        }

        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.len() < PASSWORD_MIN_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_LENGTH
            )));
        }

        Ok(())
    }

    /// Check that an email is well-formed and not taken by another account
    async fn validate_new_email(&self, email: &str, user_id: i64) -> Result<(), UserServiceError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if let Some(existing) = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?
        {
            if existing.id != user_id {
                return Err(UserServiceError::ValidationError(format!(
                    "Email '{}' is already registered",
                    email
                )));
            }
        }

        Ok(())
    }

    /// Find user by username or email
    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        // Try to find by username first
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        // Try to find by email
        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    /// Issue a fresh bearer token for a user
    async fn issue_token(&self, user_id: i64) -> Result<AuthToken, UserServiceError> {
        let now = Utc::now();
        let token = AuthToken {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.token_expiration_days),
            created_at: now,
        };

        let created = self
            .token_repo
            .create(&token)
            .await
            .context("Failed to create auth token")?;

        Ok(created)
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    /// Create a new login input
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
