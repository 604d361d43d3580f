//! Message repository
//!
//! Database operations for session chat messages.
//!
//! This module provides:
//! - `MessageRepository` trait defining the interface for message data access
//! - `SqlxMessageRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Create a new message
    async fn create(&self, message: &Message) -> Result<Message>;

    /// List a session's messages in the order they were sent
    async fn list_by_session(&self, session_id: i64) -> Result<Vec<Message>>;
}

/// SQLx-based message repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    /// Create a new SQLx message repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_message_sqlite(self.pool.as_sqlite().unwrap(), message).await
            }
            DatabaseDriver::Mysql => {
                create_message_mysql(self.pool.as_mysql().unwrap(), message).await
            }
        }
    }

    async fn list_by_session(&self, session_id: i64) -> Result<Vec<Message>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_messages_by_session_sqlite(self.pool.as_sqlite().unwrap(), session_id).await
            }
            DatabaseDriver::Mysql => {
                list_messages_by_session_mysql(self.pool.as_mysql().unwrap(), session_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_message_sqlite(pool: &SqlitePool, message: &Message) -> Result<Message> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (session_id, sender_id, text, timestamp)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(message.session_id)
    .bind(message.sender_id)
    .bind(&message.text)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: result.last_insert_rowid(),
        session_id: message.session_id,
        sender_id: message.sender_id,
        text: message.text.clone(),
        timestamp: now,
    })
}

async fn list_messages_by_session_sqlite(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<Vec<Message>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, sender_id, text, timestamp
        FROM messages
        WHERE session_id = ?
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("Failed to list messages")?;

    Ok(rows.iter().map(row_to_message_sqlite).collect())
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        session_id: row.get("session_id"),
        sender_id: row.get("sender_id"),
        text: row.get("text"),
        timestamp: row.get("timestamp"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_message_mysql(pool: &MySqlPool, message: &Message) -> Result<Message> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (session_id, sender_id, text, timestamp)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(message.session_id)
    .bind(message.sender_id)
    .bind(&message.text)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    Ok(Message {
        id: result.last_insert_id() as i64,
        session_id: message.session_id,
        sender_id: message.sender_id,
        text: message.text.clone(),
        timestamp: now,
    })
}

async fn list_messages_by_session_mysql(
    pool: &MySqlPool,
    session_id: i64,
) -> Result<Vec<Message>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, sender_id, text, timestamp
        FROM messages
        WHERE session_id = ?
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("Failed to list messages")?;

    Ok(rows.iter().map(row_to_message_mysql).collect())
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> Message {
    Message {
        id: row.get("id"),
        session_id: row.get("session_id"),
        sender_id: row.get("sender_id"),
        text: row.get("text"),
        timestamp: row.get("timestamp"),
    }
}
