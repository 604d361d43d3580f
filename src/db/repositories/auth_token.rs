//! Auth token repository
//!
//! Database operations for login tokens.
//!
//! This module provides:
//! - `AuthTokenRepository` trait defining the interface for token data access
//! - `SqlxAuthTokenRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::AuthToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Auth token repository trait
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    /// Create a new token
    async fn create(&self, token: &AuthToken) -> Result<AuthToken>;

    /// Get token by ID (the opaque token value)
    async fn get_by_id(&self, id: &str) -> Result<Option<AuthToken>>;

    /// Delete a token
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all tokens for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired tokens
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based auth token repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxAuthTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthTokenRepository {
    /// Create a new SQLx auth token repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthTokenRepository for SqlxAuthTokenRepository {
    async fn create(&self, token: &AuthToken) -> Result<AuthToken> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_token_sqlite(self.pool.as_sqlite().unwrap(), token).await
            }
            DatabaseDriver::Mysql => create_token_mysql(self.pool.as_mysql().unwrap(), token).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AuthToken>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_token_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_token_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_token_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_token_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_tokens_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                delete_tokens_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn delete_expired(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_expired_tokens_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => delete_expired_tokens_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_token_sqlite(pool: &SqlitePool, token: &AuthToken) -> Result<AuthToken> {
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (id, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&token.id)
    .bind(token.user_id)
    .bind(token.expires_at)
    .bind(token.created_at)
    .execute(pool)
    .await
    .context("Failed to create auth token")?;

    Ok(token.clone())
}

async fn get_token_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<AuthToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, expires_at, created_at
        FROM auth_tokens
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get auth token by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_token_sqlite(&row))),
        None => Ok(None),
    }
}

async fn delete_token_sqlite(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete auth token")?;

    Ok(())
}

async fn delete_tokens_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete auth tokens by user")?;

    Ok(())
}

async fn delete_expired_tokens_sqlite(pool: &SqlitePool) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired auth tokens")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_token_sqlite(row: &sqlx::sqlite::SqliteRow) -> AuthToken {
    AuthToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_token_mysql(pool: &MySqlPool, token: &AuthToken) -> Result<AuthToken> {
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (id, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&token.id)
    .bind(token.user_id)
    .bind(token.expires_at)
    .bind(token.created_at)
    .execute(pool)
    .await
    .context("Failed to create auth token")?;

    Ok(token.clone())
}

async fn get_token_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<AuthToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, expires_at, created_at
        FROM auth_tokens
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get auth token by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_token_mysql(&row))),
        None => Ok(None),
    }
}

async fn delete_token_mysql(pool: &MySqlPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete auth token")?;

    Ok(())
}

async fn delete_tokens_by_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete auth tokens by user")?;

    Ok(())
}

async fn delete_expired_tokens_mysql(pool: &MySqlPool) -> Result<i64> {
    let now = Utc::now();
    let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired auth tokens")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_token_mysql(row: &sqlx::mysql::MySqlRow) -> AuthToken {
    let expires_at: DateTime<Utc> = row.get("expires_at");
    let created_at: DateTime<Utc> = row.get("created_at");

    AuthToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at,
        created_at,
    }
}
