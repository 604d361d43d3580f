//! Session service
//!
//! Implements the mentoring session lifecycle and its guards:
//! - Idempotent session creation (exact key match, then a short duplicate
//!   window for clients that retry without a key)
//! - Lifecycle transitions: accept (mentor only), complete and cancel
//!   (either participant)
//! - Participant-scoped listing and lookup
//! - Field updates by the mentor (never the lifecycle state)
//!
//! Naive scheduled times are interpreted in the server's configured UTC
//! offset before any comparison or storage.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateSessionInput, Session, SessionStatus, SessionWindow, UpdateSessionInput};
use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;

/// How far back the duplicate-request heuristic looks when no idempotency
/// key is supplied
const DUPLICATE_WINDOW_MINUTES: i64 = 10;

/// Naive datetime formats accepted for scheduled times, tried in order
/// after RFC 3339
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Error types for session service operations
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    /// Session not found (or not visible to the caller)
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller is not allowed to perform this operation
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Operation not valid in the session's current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidStateError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Session service for requesting and running mentoring sessions
pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
    user_repo: Arc<dyn UserRepository>,
    utc_offset_hours: i32,
}

impl SessionService {
    /// Create a new session service interpreting naive times as UTC
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self::with_utc_offset(session_repo, user_repo, 0)
    }

    /// Create a session service with a configured UTC offset for naive
    /// scheduled times
    pub fn with_utc_offset(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
        utc_offset_hours: i32,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            utc_offset_hours,
        }
    }

    /// Create a session request, deduplicating client retries
    ///
    /// In order:
    /// 1. An idempotency key that matches an existing session returns that
    ///    session unchanged.
    /// 2. An identical request (same mentor, duration, description and
    ///    scheduled time, still in `requested`) created within the last ten
    ///    minutes is returned unchanged.
    /// 3. Otherwise the request is validated and a new session inserted.
    ///
    /// # Errors
    /// - `ValidationError` if the mentor does not exist or lacks the mentor
    ///   flag, the mentor is the caller, or the scheduled time is not in
    ///   the future
    pub async fn create(
        &self,
        caller_id: i64,
        input: CreateSessionInput,
    ) -> Result<Session, SessionServiceError> {
        let candidate = Session::new(caller_id, input);

        if let Some(key) = &candidate.idempotency_key {
            if let Some(existing) = self
                .session_repo
                .find_by_idempotency_key(key)
                .await
                .context("Failed to look up idempotency key")?
            {
                return Ok(existing);
            }
        }

        let window_start = Utc::now() - Duration::minutes(DUPLICATE_WINDOW_MINUTES);
        if let Some(existing) = self
            .session_repo
            .find_recent_duplicate(&candidate, window_start)
            .await
            .context("Failed to check for duplicate request")?
        {
            return Ok(existing);
        }

        self.validate_new_session(caller_id, &candidate).await?;

        self.session_repo
            .create(&candidate)
            .await
            .context("Failed to create session")
            .map_err(Into::into)
    }

    /// Accept a requested session
    ///
    /// # Errors
    /// - `NotFound` if the session does not exist
    /// - `AuthorizationError` if the caller is not the assigned mentor
    /// - `InvalidStateError` if the session is not in `requested`
    pub async fn accept(
        &self,
        caller_id: i64,
        session_id: i64,
    ) -> Result<Session, SessionServiceError> {
        let mut session = self.fetch_session(session_id).await?;

        if session.mentor_id != caller_id {
            return Err(SessionServiceError::AuthorizationError(
                "Only the mentor can accept a session".to_string(),
            ));
        }
        if session.status != SessionStatus::Requested {
            return Err(SessionServiceError::InvalidStateError(format!(
                "Cannot accept a session in status '{}'",
                session.status
            )));
        }

        session.status = SessionStatus::Accepted;
        self.session_repo
            .update(&session)
            .await
            .context("Failed to accept session")
            .map_err(Into::into)
    }

    /// Mark an accepted session as completed
    ///
    /// # Errors
    /// - `NotFound` if the session does not exist
    /// - `AuthorizationError` if the caller is neither participant
    /// - `InvalidStateError` if the session is not in `accepted`
    pub async fn complete(
        &self,
        caller_id: i64,
        session_id: i64,
    ) -> Result<Session, SessionServiceError> {
        let mut session = self.fetch_session(session_id).await?;

        if !session.is_participant(caller_id) {
            return Err(SessionServiceError::AuthorizationError(
                "Only a participant can complete a session".to_string(),
            ));
        }
        if session.status != SessionStatus::Accepted {
            return Err(SessionServiceError::InvalidStateError(format!(
                "Cannot complete a session in status '{}'",
                session.status
            )));
        }

        session.status = SessionStatus::Completed;
        self.session_repo
            .update(&session)
            .await
            .context("Failed to complete session")
            .map_err(Into::into)
    }

    /// Cancel a session that has not finished
    ///
    /// # Errors
    /// - `NotFound` if the session does not exist
    /// - `AuthorizationError` if the caller is neither participant
    /// - `InvalidStateError` if the session is already completed or
    ///   cancelled
    pub async fn cancel(
        &self,
        caller_id: i64,
        session_id: i64,
    ) -> Result<Session, SessionServiceError> {
        let mut session = self.fetch_session(session_id).await?;

        if !session.is_participant(caller_id) {
            return Err(SessionServiceError::AuthorizationError(
                "Only a participant can cancel a session".to_string(),
            ));
        }
        if session.status.is_terminal() {
            return Err(SessionServiceError::InvalidStateError(format!(
                "Cannot cancel a session in status '{}'",
                session.status
            )));
        }

        session.status = SessionStatus::Cancelled;
        self.session_repo
            .update(&session)
            .await
            .context("Failed to cancel session")
            .map_err(Into::into)
    }

    /// List the caller's sessions, newest first
    pub async fn list(
        &self,
        caller_id: i64,
        status: Option<SessionStatus>,
        window: Option<SessionWindow>,
    ) -> Result<Vec<Session>, SessionServiceError> {
        self.session_repo
            .list_for_user(caller_id, status, window)
            .await
            .context("Failed to list sessions")
            .map_err(Into::into)
    }

    /// Get a session the caller participates in
    ///
    /// A session that exists but does not involve the caller reads as not
    /// found.
    pub async fn get(
        &self,
        caller_id: i64,
        session_id: i64,
    ) -> Result<Session, SessionServiceError> {
        let session = self.fetch_session(session_id).await?;

        if !session.is_participant(caller_id) {
            return Err(SessionServiceError::NotFound(format!(
                "Session with ID {} not found",
                session_id
            )));
        }

        Ok(session)
    }

    /// Update session fields
    ///
    /// Only the mentor may update, and only the non-lifecycle fields; the
    /// status moves exclusively through accept, complete and cancel.
    ///
    /// # Errors
    /// - `NotFound` if the session does not exist
    /// - `AuthorizationError` if the caller is not the mentor
    /// - `ValidationError` if a new scheduled time is not in the future
    pub async fn update(
        &self,
        caller_id: i64,
        session_id: i64,
        input: UpdateSessionInput,
    ) -> Result<Session, SessionServiceError> {
        let mut session = self.fetch_session(session_id).await?;

        if session.mentor_id != caller_id {
            return Err(SessionServiceError::AuthorizationError(
                "Only the mentor can update a session".to_string(),
            ));
        }

        if input.is_empty() {
            return Ok(session);
        }

        if let Some(scheduled_time) = input.scheduled_time {
            self.validate_future(scheduled_time)?;
            session.scheduled_time = Some(scheduled_time);
        }
        if let Some(skill_id) = input.skill_id {
            session.skill_id = Some(skill_id);
        }
        if let Some(duration) = input.duration_minutes {
            session.duration_minutes = duration;
        }
        if let Some(description) = input.description {
            session.description = description;
        }
        if let Some(meeting_url) = input.meeting_url {
            session.meeting_url = meeting_url;
        }

        self.session_repo
            .update(&session)
            .await
            .context("Failed to update session")
            .map_err(Into::into)
    }

    /// Parse a scheduled time string into UTC
    ///
    /// Naive inputs are interpreted in the service's configured UTC offset.
    ///
    /// # Errors
    /// - `ValidationError` if the string is not a recognized datetime
    pub fn normalize_scheduled_time(
        &self,
        raw: &str,
    ) -> Result<DateTime<Utc>, SessionServiceError> {
        parse_scheduled_time(raw, self.utc_offset_hours)
            .map_err(|e| SessionServiceError::ValidationError(e.to_string()))
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn fetch_session(&self, session_id: i64) -> Result<Session, SessionServiceError> {
        self.session_repo
            .get_by_id(session_id)
            .await
            .context("Failed to get session")?
            .ok_or_else(|| {
                SessionServiceError::NotFound(format!("Session with ID {} not found", session_id))
            })
    }

    async fn validate_new_session(
        &self,
        caller_id: i64,
        candidate: &Session,
    ) -> Result<(), SessionServiceError> {
        let mentor = self
            .user_repo
            .get_with_profile(candidate.mentor_id)
            .await
            .context("Failed to look up mentor")?;

        match mentor {
            Some(mentor) if mentor.profile.is_mentor => {}
            _ => {
                return Err(SessionServiceError::ValidationError(format!(
                    "User {} is not a mentor",
                    candidate.mentor_id
                )));
            }
        }

        if candidate.mentor_id == caller_id {
            return Err(SessionServiceError::ValidationError(
                "Cannot request a session with yourself".to_string(),
            ));
        }

        if let Some(scheduled_time) = candidate.scheduled_time {
            self.validate_future(scheduled_time)?;
        }

        Ok(())
    }

    fn validate_future(&self, scheduled_time: DateTime<Utc>) -> Result<(), SessionServiceError> {
        if scheduled_time <= Utc::now() {
            return Err(SessionServiceError::ValidationError(
                "Scheduled time must be in the future".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a scheduled time string into UTC
///
/// RFC 3339 strings keep their own offset. Naive strings (no offset) are
/// interpreted at `utc_offset_hours` from UTC.
pub fn parse_scheduled_time(raw: &str, utc_offset_hours: i32) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .ok_or_else(|| anyhow::anyhow!("Invalid UTC offset: {} hours", utc_offset_hours))?;

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return match offset.from_local_datetime(&naive) {
                LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
                _ => Err(anyhow::anyhow!("Invalid datetime: {}", trimmed)),
            };
        }
    }

    Err(anyhow::anyhow!("Invalid datetime format: {}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{SessionDuration, User};

    async fn setup_test_service() -> (DynDatabasePool, Arc<dyn UserRepository>, SessionService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let service = SessionService::new(session_repo, user_repo.clone());

        (pool, user_repo, service)
    }

    async fn create_user(repo: &Arc<dyn UserRepository>, username: &str, is_mentor: bool) -> i64 {
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hashed_password".to_string(),
            "Test".to_string(),
            "User".to_string(),
        );
        let (created, mut profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        if is_mentor {
            profile.is_mentor = true;
            repo.update_profile(&profile)
                .await
                .expect("Failed to update profile");
        }

        created.id
    }

    fn request_input(mentor_id: i64) -> CreateSessionInput {
        CreateSessionInput {
            mentor_id,
            skill_id: None,
            duration_minutes: SessionDuration::Min30,
            description: "Ownership deep dive".to_string(),
            scheduled_time: None,
            idempotency_key: None,
        }
    }

    // ========================================================================
    // create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_session() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");

        assert!(session.id > 0);
        assert_eq!(session.requester_id, learner);
        assert_eq!(session.mentor_id, mentor);
        assert_eq!(session.status, SessionStatus::Requested);
    }

    #[tokio::test]
    async fn test_create_rejects_non_mentor() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let plain_user = create_user(&user_repo, "plain", false).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let result = service.create(learner, request_input(plain_user)).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_mentor() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let learner = create_user(&user_repo, "learner", false).await;

        let result = service.create(learner, request_input(999)).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_self_request() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;

        let result = service.create(mentor, request_input(mentor)).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_past_scheduled_time() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let mut input = request_input(mentor);
        input.scheduled_time = Some(Utc::now() - Duration::hours(1));

        let result = service.create(learner, input).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_accepts_future_scheduled_time() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let scheduled = Utc::now() + Duration::days(1);
        let mut input = request_input(mentor);
        input.scheduled_time = Some(scheduled);

        let session = service
            .create(learner, input)
            .await
            .expect("Failed to create session");
        assert_eq!(session.scheduled_time, Some(scheduled));
    }

    #[tokio::test]
    async fn test_create_replays_idempotency_key() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let mut input = request_input(mentor);
        input.idempotency_key = Some("retry-abc".to_string());

        let first = service
            .create(learner, input.clone())
            .await
            .expect("Failed to create session");

        // The replay returns the original even when the body differs
        input.description = "Something else entirely".to_string();
        let second = service
            .create(learner, input)
            .await
            .expect("Failed to replay request");

        assert_eq!(second.id, first.id);
        assert_eq!(second.description, "Ownership deep dive");

        let sessions = service.list(learner, None, None).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_create_dedupes_within_window() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let first = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");
        let second = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");

        assert_eq!(second.id, first.id);

        let sessions = service.list(learner, None, None).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_create_window_requires_identical_fields() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let first = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");

        let mut input = request_input(mentor);
        input.description = "Async runtimes".to_string();
        let second = service
            .create(learner, input)
            .await
            .expect("Failed to create session");

        assert_ne!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_create_dedup_ignores_accepted_sessions() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let first = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");
        service.accept(mentor, first.id).await.expect("Failed to accept");

        let second = service
            .create(learner, request_input(mentor))
            .await
            .expect("Failed to create session");
        assert_ne!(second.id, first.id);
    }

    // ========================================================================
    // accept tests
    // ========================================================================

    #[tokio::test]
    async fn test_accept_by_mentor() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        let accepted = service
            .accept(mentor, session.id)
            .await
            .expect("Failed to accept session");

        assert_eq!(accepted.status, SessionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_accept_by_requester_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let result = service.accept(learner, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::AuthorizationError(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_twice_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, session.id).await.expect("Failed to accept");

        let result = service.accept(mentor, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::InvalidStateError(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_missing_session() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;

        let result = service.accept(mentor, 999).await;
        assert!(matches!(result, Err(SessionServiceError::NotFound(_))));
    }

    // ========================================================================
    // complete tests
    // ========================================================================

    #[tokio::test]
    async fn test_complete_by_either_participant() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let by_requester = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, by_requester.id).await.unwrap();
        let completed = service
            .complete(learner, by_requester.id)
            .await
            .expect("Requester should complete");
        assert_eq!(completed.status, SessionStatus::Completed);

        let mut input = request_input(mentor);
        input.description = "Second round".to_string();
        let by_mentor = service.create(learner, input).await.unwrap();
        service.accept(mentor, by_mentor.id).await.unwrap();
        let completed = service
            .complete(mentor, by_mentor.id)
            .await
            .expect("Mentor should complete");
        assert_eq!(completed.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_requires_accepted() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let result = service.complete(learner, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::InvalidStateError(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_by_outsider_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;
        let outsider = create_user(&user_repo, "outsider", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, session.id).await.unwrap();

        let result = service.complete(outsider, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::AuthorizationError(_))
        ));
    }

    // ========================================================================
    // cancel tests
    // ========================================================================

    #[tokio::test]
    async fn test_cancel_from_requested() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        let cancelled = service
            .cancel(learner, session.id)
            .await
            .expect("Failed to cancel session");

        assert_eq!(cancelled.status, SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_from_accepted() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, session.id).await.unwrap();

        let cancelled = service
            .cancel(mentor, session.id)
            .await
            .expect("Failed to cancel session");
        assert_eq!(cancelled.status, SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_completed_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, session.id).await.unwrap();
        service.complete(learner, session.id).await.unwrap();

        let result = service.cancel(learner, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::InvalidStateError(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_by_outsider_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;
        let outsider = create_user(&user_repo, "outsider", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let result = service.cancel(outsider, session.id).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::AuthorizationError(_))
        ));
    }

    // ========================================================================
    // get and list tests
    // ========================================================================

    #[tokio::test]
    async fn test_get_as_participant() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let seen_by_requester = service.get(learner, session.id).await.unwrap();
        assert_eq!(seen_by_requester.id, session.id);

        let seen_by_mentor = service.get(mentor, session.id).await.unwrap();
        assert_eq!(seen_by_mentor.id, session.id);
    }

    #[tokio::test]
    async fn test_get_hidden_from_outsider() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;
        let outsider = create_user(&user_repo, "outsider", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let result = service.get(outsider, session.id).await;
        assert!(matches!(result, Err(SessionServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_session() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let learner = create_user(&user_repo, "learner", false).await;

        let result = service.get(learner, 999).await;
        assert!(matches!(result, Err(SessionServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let open = service.create(learner, request_input(mentor)).await.unwrap();

        let mut input = request_input(mentor);
        input.description = "Another topic".to_string();
        let done = service.create(learner, input).await.unwrap();
        service.accept(mentor, done.id).await.unwrap();
        service.complete(learner, done.id).await.unwrap();

        let requested = service
            .list(learner, Some(SessionStatus::Requested), None)
            .await
            .unwrap();
        assert_eq!(requested.len(), 1);
        assert_eq!(requested[0].id, open.id);

        let past = service
            .list(learner, None, Some(SessionWindow::Past))
            .await
            .unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].id, done.id);

        let all = service.list(learner, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    // ========================================================================
    // update tests
    // ========================================================================

    #[tokio::test]
    async fn test_update_by_mentor() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let input = UpdateSessionInput {
            description: Some("Narrowed scope".to_string()),
            duration_minutes: Some(SessionDuration::Min60),
            meeting_url: Some("https://meet.example.com/abc".to_string()),
            ..Default::default()
        };
        let updated = service
            .update(mentor, session.id, input)
            .await
            .expect("Failed to update session");

        assert_eq!(updated.description, "Narrowed scope");
        assert_eq!(updated.duration_minutes, SessionDuration::Min60);
        assert_eq!(updated.meeting_url, "https://meet.example.com/abc");
    }

    #[tokio::test]
    async fn test_update_by_requester_fails() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let input = UpdateSessionInput {
            description: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let result = service.update(learner, session.id, input).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::AuthorizationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_past_time() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let input = UpdateSessionInput {
            scheduled_time: Some(Utc::now() - Duration::hours(1)),
            ..Default::default()
        };
        let result = service.update(mentor, session.id, input).await;
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_empty_patch_returns_current() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();

        let updated = service
            .update(mentor, session.id, UpdateSessionInput::default())
            .await
            .expect("Empty patch should be a no-op");

        assert_eq!(updated.description, session.description);
    }

    #[tokio::test]
    async fn test_update_never_touches_status() {
        let (_pool, user_repo, service) = setup_test_service().await;
        let mentor = create_user(&user_repo, "mentor", true).await;
        let learner = create_user(&user_repo, "learner", false).await;

        let session = service.create(learner, request_input(mentor)).await.unwrap();
        service.accept(mentor, session.id).await.unwrap();

        let input = UpdateSessionInput {
            description: Some("Still accepted".to_string()),
            ..Default::default()
        };
        let updated = service.update(mentor, session.id, input).await.unwrap();

        assert_eq!(updated.status, SessionStatus::Accepted);
    }

    // ========================================================================
    // scheduled time parsing tests
    // ========================================================================

    #[test]
    fn test_parse_scheduled_time_rfc3339() {
        let parsed = parse_scheduled_time("2030-05-01T10:00:00Z", 0).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_honors_explicit_offset() {
        // An explicit offset wins over the configured one
        let parsed = parse_scheduled_time("2030-05-01T12:00:00+02:00", 5).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_naive_uses_configured_offset() {
        let parsed = parse_scheduled_time("2030-05-01T12:00:00", 2).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_negative_offset() {
        let parsed = parse_scheduled_time("2030-05-01T12:00:00", -3).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_space_separator() {
        let parsed = parse_scheduled_time("2030-05-01 12:00:00", 0).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_minute_precision() {
        let parsed = parse_scheduled_time("2030-05-01T12:30", 0).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_scheduled_time_invalid() {
        assert!(parse_scheduled_time("next tuesday", 0).is_err());
        assert!(parse_scheduled_time("", 0).is_err());
    }

    #[tokio::test]
    async fn test_normalize_scheduled_time_maps_to_validation_error() {
        let (_pool, _user_repo, service) = setup_test_service().await;

        let result = service.normalize_scheduled_time("not a date");
        assert!(matches!(
            result,
            Err(SessionServiceError::ValidationError(_))
        ));
    }
}
