//! Message service
//!
//! Implements the session chat:
//! - Listing a session's messages in send order, visible to participants
//!   only (outsiders silently get an empty list)
//! - Posting messages, restricted to participants

use crate::db::repositories::{MessageRepository, SessionRepository};
use crate::models::Message;
use anyhow::Context;
use std::sync::Arc;

/// Error types for message service operations
#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
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

/// Message service for session chat
pub struct MessageService {
    message_repo: Arc<dyn MessageRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl MessageService {
    /// Create a new message service
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            message_repo,
            session_repo,
        }
    }

    /// List a session's messages, oldest first
    ///
    /// Non-participants and unknown sessions get an empty list rather than
    /// an error.
    pub async fn list(
        &self,
        caller_id: i64,
        session_id: i64,
    ) -> Result<Vec<Message>, MessageServiceError> {
        let session = self
            .session_repo
            .get_by_id(session_id)
            .await
            .context("Failed to get session")?;

        match session {
            Some(session) if session.is_participant(caller_id) => self
                .message_repo
                .list_by_session(session_id)
                .await
                .context("Failed to list messages")
                .map_err(Into::into),
            _ => Ok(Vec::new()),
        }
    }

    /// Post a message to a session's chat
    ///
    /// # Errors
    /// - `ValidationError` if the text is empty
    /// - `NotFound` if the session does not exist
    /// - `AuthorizationError` if the caller is not a participant
    pub async fn create(
        &self,
        caller_id: i64,
        session_id: i64,
        text: &str,
    ) -> Result<Message, MessageServiceError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MessageServiceError::ValidationError(
                "Message text cannot be empty".to_string(),
            ));
        }

        let session = self
            .session_repo
            .get_by_id(session_id)
            .await
            .context("Failed to get session")?
            .ok_or_else(|| {
                MessageServiceError::NotFound(format!("Session with ID {} not found", session_id))
            })?;

        if !session.is_participant(caller_id) {
            return Err(MessageServiceError::AuthorizationError(
                "Only a participant can post to a session".to_string(),
            ));
        }

        let message = Message::new(session_id, caller_id, trimmed.to_string());
        self.message_repo
            .create(&message)
            .await
            .context("Failed to create message")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxMessageRepository, SqlxSessionRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateSessionInput, Session, SessionDuration, User};

    struct TestContext {
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        service: MessageService,
    }

    async fn setup_test_service() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let message_repo = SqlxMessageRepository::boxed(pool.clone());
        let service = MessageService::new(message_repo, session_repo.clone());

        TestContext {
            user_repo,
            session_repo,
            service,
        }
    }

    async fn create_user(ctx: &TestContext, username: &str) -> i64 {
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hashed_password".to_string(),
            "Test".to_string(),
            "User".to_string(),
        );
        let (created, _profile) = ctx
            .user_repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");
        created.id
    }

    async fn create_session(ctx: &TestContext, requester_id: i64, mentor_id: i64) -> Session {
        let session = Session::new(
            requester_id,
            CreateSessionInput {
                mentor_id,
                skill_id: None,
                duration_minutes: SessionDuration::Min30,
                description: "Ownership deep dive".to_string(),
                scheduled_time: None,
                idempotency_key: None,
            },
        );
        ctx.session_repo
            .create(&session)
            .await
            .expect("Failed to create session")
    }

    // ========================================================================
    // create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_message_as_participant() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let session = create_session(&ctx, learner, mentor).await;

        let message = ctx
            .service
            .create(learner, session.id, "Does Thursday work?")
            .await
            .expect("Failed to create message");

        assert!(message.id > 0);
        assert_eq!(message.sender_id, learner);
        assert_eq!(message.text, "Does Thursday work?");
    }

    #[tokio::test]
    async fn test_create_message_trims_text() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let session = create_session(&ctx, learner, mentor).await;

        let message = ctx
            .service
            .create(mentor, session.id, "  Sure, 10am?  ")
            .await
            .expect("Failed to create message");

        assert_eq!(message.text, "Sure, 10am?");
    }

    #[tokio::test]
    async fn test_create_message_empty_text_fails() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let session = create_session(&ctx, learner, mentor).await;

        for text in ["", "   ", "\n\t"] {
            let result = ctx.service.create(learner, session.id, text).await;
            assert!(matches!(
                result,
                Err(MessageServiceError::ValidationError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_create_message_by_outsider_fails() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let outsider = create_user(&ctx, "outsider").await;
        let session = create_session(&ctx, learner, mentor).await;

        let result = ctx.service.create(outsider, session.id, "Hello").await;
        assert!(matches!(
            result,
            Err(MessageServiceError::AuthorizationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_message_missing_session() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;

        let result = ctx.service.create(learner, 999, "Hello").await;
        assert!(matches!(result, Err(MessageServiceError::NotFound(_))));
    }

    // ========================================================================
    // list tests
    // ========================================================================

    #[tokio::test]
    async fn test_list_messages_in_send_order() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let session = create_session(&ctx, learner, mentor).await;

        ctx.service
            .create(learner, session.id, "Does Thursday work?")
            .await
            .unwrap();
        ctx.service
            .create(mentor, session.id, "Thursday is fine")
            .await
            .unwrap();
        ctx.service
            .create(learner, session.id, "See you then")
            .await
            .unwrap();

        let messages = ctx
            .service
            .list(mentor, session.id)
            .await
            .expect("Failed to list messages");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "Does Thursday work?");
        assert_eq!(messages[1].text, "Thursday is fine");
        assert_eq!(messages[2].text, "See you then");
    }

    #[tokio::test]
    async fn test_list_messages_outsider_gets_empty() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let outsider = create_user(&ctx, "outsider").await;
        let session = create_session(&ctx, learner, mentor).await;

        ctx.service
            .create(learner, session.id, "Private planning")
            .await
            .unwrap();

        let messages = ctx
            .service
            .list(outsider, session.id)
            .await
            .expect("List should not error for outsiders");
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_missing_session_gets_empty() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;

        let messages = ctx
            .service
            .list(learner, 999)
            .await
            .expect("List should not error for unknown sessions");
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_empty_session() {
        let ctx = setup_test_service().await;
        let learner = create_user(&ctx, "learner").await;
        let mentor = create_user(&ctx, "mentor").await;
        let session = create_session(&ctx, learner, mentor).await;

        let messages = ctx
            .service
            .list(learner, session.id)
            .await
            .expect("Failed to list messages");
        assert!(messages.is_empty());
    }
}
