//! Session repository
//!
//! Database operations for mentoring sessions.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL
//!
//! Creation is race-safe with respect to idempotency keys: the unique index
//! on `idempotency_key` picks one winner among concurrent inserts and the
//! losers are handed the winner's row.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Session, SessionDuration, SessionStatus, SessionWindow};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session.
    ///
    /// If another session with the same idempotency key already exists, that
    /// session is returned instead of inserting a new row.
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Session>>;

    /// Get the session carrying the given idempotency key
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Session>>;

    /// Find a still-requested session matching the same requester, mentor,
    /// schedule, duration, and description, created at or after
    /// `window_start`
    async fn find_recent_duplicate(
        &self,
        session: &Session,
        window_start: DateTime<Utc>,
    ) -> Result<Option<Session>>;

    /// List sessions where the user is requester or mentor, newest first
    async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<SessionStatus>,
        window: Option<SessionWindow>,
    ) -> Result<Vec<Session>>;

    /// Update a session's mutable fields and status
    async fn update(&self, session: &Session) -> Result<Session>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_session_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_session_by_idempotency_key_sqlite(self.pool.as_sqlite().unwrap(), key).await
            }
            DatabaseDriver::Mysql => {
                find_session_by_idempotency_key_mysql(self.pool.as_mysql().unwrap(), key).await
            }
        }
    }

    async fn find_recent_duplicate(
        &self,
        session: &Session,
        window_start: DateTime<Utc>,
    ) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_recent_duplicate_sqlite(self.pool.as_sqlite().unwrap(), session, window_start)
                    .await
            }
            DatabaseDriver::Mysql => {
                find_recent_duplicate_mysql(self.pool.as_mysql().unwrap(), session, window_start)
                    .await
            }
        }
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<SessionStatus>,
        window: Option<SessionWindow>,
    ) -> Result<Vec<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sessions_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id, status, window)
                    .await
            }
            DatabaseDriver::Mysql => {
                list_sessions_for_user_mysql(self.pool.as_mysql().unwrap(), user_id, status, window)
                    .await
            }
        }
    }

    async fn update(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                update_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Build the session listing query for the given filters.
///
/// Placeholders appear in a fixed order: user ID twice, then the status,
/// then the two window statuses. Callers must bind in the same order.
fn build_session_list_query(
    status: Option<SessionStatus>,
    window: Option<SessionWindow>,
) -> String {
    let mut sql = String::from(
        r#"
        SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
               status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
        FROM sessions
        WHERE (requester_id = ? OR mentor_id = ?)
        "#,
    );

    if status.is_some() {
        sql.push_str("AND status = ?\n");
    }
    if window.is_some() {
        sql.push_str("AND status IN (?, ?)\n");
    }

    sql.push_str("ORDER BY created_at DESC");
    sql
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let status_str = session.status.to_string();
    let duration = session.duration_minutes.as_minutes();

    let insert = sqlx::query(
        r#"
        INSERT INTO sessions (requester_id, mentor_id, skill_id, duration_minutes, description,
                              status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.requester_id)
    .bind(session.mentor_id)
    .bind(session.skill_id)
    .bind(duration)
    .bind(&session.description)
    .bind(&status_str)
    .bind(session.scheduled_time)
    .bind(&session.meeting_url)
    .bind(&session.idempotency_key)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    let result = match insert {
        Ok(result) => result,
        Err(err) => {
            // A concurrent request with the same key may win the insert
            if is_unique_violation(&err) {
                if let Some(key) = &session.idempotency_key {
                    if let Some(existing) =
                        find_session_by_idempotency_key_sqlite(pool, key).await?
                    {
                        return Ok(existing);
                    }
                }
            }
            return Err(err).context("Failed to create session");
        }
    };

    let id = result.last_insert_rowid();

    Ok(Session {
        id,
        requester_id: session.requester_id,
        mentor_id: session.mentor_id,
        skill_id: session.skill_id,
        duration_minutes: session.duration_minutes,
        description: session.description.clone(),
        status: session.status,
        scheduled_time: session.scheduled_time,
        meeting_url: session.meeting_url.clone(),
        idempotency_key: session.idempotency_key.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_session_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
               status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn find_session_by_idempotency_key_sqlite(
    pool: &SqlitePool,
    key: &str,
) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
               status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
        FROM sessions
        WHERE idempotency_key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to find session by idempotency key")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn find_recent_duplicate_sqlite(
    pool: &SqlitePool,
    session: &Session,
    window_start: DateTime<Utc>,
) -> Result<Option<Session>> {
    let duration = session.duration_minutes.as_minutes();

    let query = match session.scheduled_time {
        Some(scheduled_time) => sqlx::query(
            r#"
            SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
                   status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
            FROM sessions
            WHERE requester_id = ? AND mentor_id = ? AND scheduled_time = ?
              AND duration_minutes = ? AND description = ? AND status = 'requested'
              AND created_at >= ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session.requester_id)
        .bind(session.mentor_id)
        .bind(scheduled_time)
        .bind(duration)
        .bind(&session.description)
        .bind(window_start),
        None => sqlx::query(
            r#"
            SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
                   status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
            FROM sessions
            WHERE requester_id = ? AND mentor_id = ? AND scheduled_time IS NULL
              AND duration_minutes = ? AND description = ? AND status = 'requested'
              AND created_at >= ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session.requester_id)
        .bind(session.mentor_id)
        .bind(duration)
        .bind(&session.description)
        .bind(window_start),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to find duplicate session")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_sessions_for_user_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    status: Option<SessionStatus>,
    window: Option<SessionWindow>,
) -> Result<Vec<Session>> {
    let sql = build_session_list_query(status, window);
    let mut query = sqlx::query(&sql).bind(user_id).bind(user_id);

    if let Some(status) = status {
        query = query.bind(status.to_string());
    }
    if let Some(window) = window {
        let [first, second] = window.statuses();
        query = query.bind(first.to_string()).bind(second.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_sqlite(&row)?);
    }

    Ok(sessions)
}

async fn update_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let status_str = session.status.to_string();
    let duration = session.duration_minutes.as_minutes();

    sqlx::query(
        r#"
        UPDATE sessions
        SET skill_id = ?, duration_minutes = ?, description = ?, status = ?,
            scheduled_time = ?, meeting_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(session.skill_id)
    .bind(duration)
    .bind(&session.description)
    .bind(&status_str)
    .bind(session.scheduled_time)
    .bind(&session.meeting_url)
    .bind(now)
    .bind(session.id)
    .execute(pool)
    .await
    .context("Failed to update session")?;

    // Return the updated session
    get_session_by_id_sqlite(pool, session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session not found after update"))
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    let status_str: String = row.get("status");
    let status = SessionStatus::from_str(&status_str)
        .with_context(|| format!("Invalid session status in database: {}", status_str))?;

    let duration_raw: i64 = row.get("duration_minutes");
    let duration_minutes = SessionDuration::try_from(duration_raw).map_err(anyhow::Error::msg)?;

    Ok(Session {
        id: row.get("id"),
        requester_id: row.get("requester_id"),
        mentor_id: row.get("mentor_id"),
        skill_id: row.get("skill_id"),
        duration_minutes,
        description: row.get("description"),
        status,
        scheduled_time: row.get("scheduled_time"),
        meeting_url: row.get("meeting_url"),
        idempotency_key: row.get("idempotency_key"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let status_str = session.status.to_string();
    let duration = session.duration_minutes.as_minutes();

    let insert = sqlx::query(
        r#"
        INSERT INTO sessions (requester_id, mentor_id, skill_id, duration_minutes, description,
                              status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.requester_id)
    .bind(session.mentor_id)
    .bind(session.skill_id)
    .bind(duration)
    .bind(&session.description)
    .bind(&status_str)
    .bind(session.scheduled_time)
    .bind(&session.meeting_url)
    .bind(&session.idempotency_key)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    let result = match insert {
        Ok(result) => result,
        Err(err) => {
            // A concurrent request with the same key may win the insert
            if is_unique_violation(&err) {
                if let Some(key) = &session.idempotency_key {
                    if let Some(existing) =
                        find_session_by_idempotency_key_mysql(pool, key).await?
                    {
                        return Ok(existing);
                    }
                }
            }
            return Err(err).context("Failed to create session");
        }
    };

    let id = result.last_insert_id() as i64;

    Ok(Session {
        id,
        requester_id: session.requester_id,
        mentor_id: session.mentor_id,
        skill_id: session.skill_id,
        duration_minutes: session.duration_minutes,
        description: session.description.clone(),
        status: session.status,
        scheduled_time: session.scheduled_time,
        meeting_url: session.meeting_url.clone(),
        idempotency_key: session.idempotency_key.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_session_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
               status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn find_session_by_idempotency_key_mysql(
    pool: &MySqlPool,
    key: &str,
) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
               status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
        FROM sessions
        WHERE idempotency_key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to find session by idempotency key")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn find_recent_duplicate_mysql(
    pool: &MySqlPool,
    session: &Session,
    window_start: DateTime<Utc>,
) -> Result<Option<Session>> {
    let duration = session.duration_minutes.as_minutes();

    let query = match session.scheduled_time {
        Some(scheduled_time) => sqlx::query(
            r#"
            SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
                   status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
            FROM sessions
            WHERE requester_id = ? AND mentor_id = ? AND scheduled_time = ?
              AND duration_minutes = ? AND description = ? AND status = 'requested'
              AND created_at >= ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session.requester_id)
        .bind(session.mentor_id)
        .bind(scheduled_time)
        .bind(duration)
        .bind(&session.description)
        .bind(window_start),
        None => sqlx::query(
            r#"
            SELECT id, requester_id, mentor_id, skill_id, duration_minutes, description,
                   status, scheduled_time, meeting_url, idempotency_key, created_at, updated_at
            FROM sessions
            WHERE requester_id = ? AND mentor_id = ? AND scheduled_time IS NULL
              AND duration_minutes = ? AND description = ? AND status = 'requested'
              AND created_at >= ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session.requester_id)
        .bind(session.mentor_id)
        .bind(duration)
        .bind(&session.description)
        .bind(window_start),
    };

    let row = query
        .fetch_optional(pool)
        .await
        .context("Failed to find duplicate session")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_sessions_for_user_mysql(
    pool: &MySqlPool,
    user_id: i64,
    status: Option<SessionStatus>,
    window: Option<SessionWindow>,
) -> Result<Vec<Session>> {
    let sql = build_session_list_query(status, window);
    let mut query = sqlx::query(&sql).bind(user_id).bind(user_id);

    if let Some(status) = status {
        query = query.bind(status.to_string());
    }
    if let Some(window) = window {
        let [first, second] = window.statuses();
        query = query.bind(first.to_string()).bind(second.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_mysql(&row)?);
    }

    Ok(sessions)
}

async fn update_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    let now = Utc::now();
    let status_str = session.status.to_string();
    let duration = session.duration_minutes.as_minutes();

    sqlx::query(
        r#"
        UPDATE sessions
        SET skill_id = ?, duration_minutes = ?, description = ?, status = ?,
            scheduled_time = ?, meeting_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(session.skill_id)
    .bind(duration)
    .bind(&session.description)
    .bind(&status_str)
    .bind(session.scheduled_time)
    .bind(&session.meeting_url)
    .bind(now)
    .bind(session.id)
    .execute(pool)
    .await
    .context("Failed to update session")?;

    // Return the updated session
    get_session_by_id_mysql(pool, session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session not found after update"))
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Session> {
    let status_str: String = row.get("status");
    let status = SessionStatus::from_str(&status_str)
        .with_context(|| format!("Invalid session status in database: {}", status_str))?;

    let duration_raw: i64 = row.get("duration_minutes");
    let duration_minutes = SessionDuration::try_from(duration_raw).map_err(anyhow::Error::msg)?;

    Ok(Session {
        id: row.get("id"),
        requester_id: row.get("requester_id"),
        mentor_id: row.get("mentor_id"),
        skill_id: row.get("skill_id"),
        duration_minutes,
        description: row.get("description"),
        status,
        scheduled_time: row.get("scheduled_time"),
        meeting_url: row.get("meeting_url"),
        idempotency_key: row.get("idempotency_key"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
