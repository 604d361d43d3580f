//! Rating repository
//!
//! Database operations for session ratings.
//!
//! This module provides:
//! - `RatingRepository` trait defining the interface for rating data access
//! - `SqlxRatingRepository` implementing the trait for SQLite and MySQL
//!
//! Creating a rating and recomputing the mentor's profile aggregate happen
//! in a single transaction so the stored average never drifts from the
//! rating rows.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Rating;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Rating repository trait
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert a rating and recompute the mentor's aggregate atomically
    async fn create_and_recompute(&self, rating: &Rating, mentor_id: i64) -> Result<Rating>;

    /// Get the rating for a session, if one exists
    async fn get_by_session_id(&self, session_id: i64) -> Result<Option<Rating>>;

    /// List ratings, newest first, optionally only those for sessions
    /// mentored by the given user
    async fn list(&self, mentor_id: Option<i64>) -> Result<Vec<Rating>>;
}

/// SQLx-based rating repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxRatingRepository {
    pool: DynDatabasePool,
}

impl SqlxRatingRepository {
    /// Create a new SQLx rating repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RatingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RatingRepository for SqlxRatingRepository {
    async fn create_and_recompute(&self, rating: &Rating, mentor_id: i64) -> Result<Rating> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_rating_sqlite(self.pool.as_sqlite().unwrap(), rating, mentor_id).await
            }
            DatabaseDriver::Mysql => {
                create_rating_mysql(self.pool.as_mysql().unwrap(), rating, mentor_id).await
            }
        }
    }

    async fn get_by_session_id(&self, session_id: i64) -> Result<Option<Rating>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_rating_by_session_id_sqlite(self.pool.as_sqlite().unwrap(), session_id).await
            }
            DatabaseDriver::Mysql => {
                get_rating_by_session_id_mysql(self.pool.as_mysql().unwrap(), session_id).await
            }
        }
    }

    async fn list(&self, mentor_id: Option<i64>) -> Result<Vec<Rating>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_ratings_sqlite(self.pool.as_sqlite().unwrap(), mentor_id).await
            }
            DatabaseDriver::Mysql => {
                list_ratings_mysql(self.pool.as_mysql().unwrap(), mentor_id).await
            }
        }
    }
}

fn average(total: i64, count: i64) -> f64 {
    if count > 0 {
        total as f64 / count as f64
    } else {
        0.0
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_rating_sqlite(
    pool: &SqlitePool,
    rating: &Rating,
    mentor_id: i64,
) -> Result<Rating> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO ratings (session_id, rater_id, score, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(rating.session_id)
    .bind(rating.rater_id)
    .bind(rating.score)
    .bind(&rating.comment)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create rating")?;

    let id = result.last_insert_rowid();

    let aggregate = sqlx::query(
        r#"
        SELECT COUNT(r.id) AS rating_count, COALESCE(SUM(r.score), 0) AS rating_total
        FROM ratings r
        INNER JOIN sessions s ON s.id = r.session_id
        WHERE s.mentor_id = ? AND s.status = 'completed'
        "#,
    )
    .bind(mentor_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to compute rating aggregate")?;

    let rating_count: i64 = aggregate.get("rating_count");
    let rating_total: i64 = aggregate.get("rating_total");

    sqlx::query(
        r#"
        UPDATE profiles
        SET rating_avg = ?, rating_count = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(average(rating_total, rating_count))
    .bind(rating_count)
    .bind(now)
    .bind(mentor_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update mentor rating aggregate")?;

    tx.commit().await.context("Failed to commit transaction")?;

    Ok(Rating {
        id,
        session_id: rating.session_id,
        rater_id: rating.rater_id,
        score: rating.score,
        comment: rating.comment.clone(),
        created_at: now,
    })
}

async fn get_rating_by_session_id_sqlite(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<Option<Rating>> {
    let row = sqlx::query(
        r#"
        SELECT id, session_id, rater_id, score, comment, created_at
        FROM ratings
        WHERE session_id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get rating by session ID")?;

    Ok(row.map(|row| row_to_rating_sqlite(&row)))
}

async fn list_ratings_sqlite(pool: &SqlitePool, mentor_id: Option<i64>) -> Result<Vec<Rating>> {
    let rows = match mentor_id {
        Some(mentor_id) => {
            sqlx::query(
                r#"
                SELECT r.id, r.session_id, r.rater_id, r.score, r.comment, r.created_at
                FROM ratings r
                INNER JOIN sessions s ON s.id = r.session_id
                WHERE s.mentor_id = ?
                ORDER BY r.created_at DESC
                "#,
            )
            .bind(mentor_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, session_id, rater_id, score, comment, created_at
                FROM ratings
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list ratings")?;

    Ok(rows.iter().map(row_to_rating_sqlite).collect())
}

fn row_to_rating_sqlite(row: &sqlx::sqlite::SqliteRow) -> Rating {
    Rating {
        id: row.get("id"),
        session_id: row.get("session_id"),
        rater_id: row.get("rater_id"),
        score: row.get("score"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_rating_mysql(pool: &MySqlPool, rating: &Rating, mentor_id: i64) -> Result<Rating> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO ratings (session_id, rater_id, score, comment, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(rating.session_id)
    .bind(rating.rater_id)
    .bind(rating.score)
    .bind(&rating.comment)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create rating")?;

    let id = result.last_insert_id() as i64;

    let aggregate = sqlx::query(
        r#"
        SELECT COUNT(r.id) AS rating_count,
               CAST(COALESCE(SUM(r.score), 0) AS SIGNED) AS rating_total
        FROM ratings r
        INNER JOIN sessions s ON s.id = r.session_id
        WHERE s.mentor_id = ? AND s.status = 'completed'
        "#,
    )
    .bind(mentor_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to compute rating aggregate")?;

    let rating_count: i64 = aggregate.get("rating_count");
    let rating_total: i64 = aggregate.get("rating_total");

    sqlx::query(
        r#"
        UPDATE profiles
        SET rating_avg = ?, rating_count = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(average(rating_total, rating_count))
    .bind(rating_count)
    .bind(now)
    .bind(mentor_id)
    .execute(&mut *tx)
    .await
    .context("Failed to update mentor rating aggregate")?;

    tx.commit().await.context("Failed to commit transaction")?;

    Ok(Rating {
        id,
        session_id: rating.session_id,
        rater_id: rating.rater_id,
        score: rating.score,
        comment: rating.comment.clone(),
        created_at: now,
    })
}

async fn get_rating_by_session_id_mysql(
    pool: &MySqlPool,
    session_id: i64,
) -> Result<Option<Rating>> {
    let row = sqlx::query(
        r#"
        SELECT id, session_id, rater_id, score, comment, created_at
        FROM ratings
        WHERE session_id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get rating by session ID")?;

    Ok(row.map(|row| row_to_rating_mysql(&row)))
}

async fn list_ratings_mysql(pool: &MySqlPool, mentor_id: Option<i64>) -> Result<Vec<Rating>> {
    let rows = match mentor_id {
        Some(mentor_id) => {
            sqlx::query(
                r#"
                SELECT r.id, r.session_id, r.rater_id, r.score, r.comment, r.created_at
                FROM ratings r
                INNER JOIN sessions s ON s.id = r.session_id
                WHERE s.mentor_id = ?
                ORDER BY r.created_at DESC
                "#,
            )
            .bind(mentor_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, session_id, rater_id, score, comment, created_at
                FROM ratings
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list ratings")?;

    Ok(rows.iter().map(row_to_rating_mysql).collect())
}

fn row_to_rating_mysql(row: &sqlx::mysql::MySqlRow) -> Rating {
    Rating {
        id: row.get("id"),
        session_id: row.get("session_id"),
        rater_id: row.get("rater_id"),
        score: row.get("score"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::session::{SessionRepository, SqlxSessionRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{
        CreateSessionInput, Session, SessionDuration, SessionStatus, User,
    };

    async fn setup_test_repo() -> (DynDatabasePool, SqlxRatingRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxRatingRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_user(pool: &DynDatabasePool, username: &str) -> i64 {
        let user_repo = SqlxUserRepository::new(pool.clone());
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hash".to_string(),
            String::new(),
            String::new(),
        );
        let (created, _) = user_repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create test user");
        created.id
    }

    async fn create_session_with_status(
        pool: &DynDatabasePool,
        requester: i64,
        mentor: i64,
        description: &str,
        status: SessionStatus,
    ) -> Session {
        let session_repo = SqlxSessionRepository::new(pool.clone());
        let session = Session::new(
            requester,
            CreateSessionInput {
                mentor_id: mentor,
                skill_id: None,
                duration_minutes: SessionDuration::Min30,
                description: description.to_string(),
                scheduled_time: None,
                idempotency_key: None,
            },
        );
        let mut created = session_repo
            .create(&session)
            .await
            .expect("Failed to create test session");
        if status != SessionStatus::Requested {
            created.status = status;
            created = session_repo
                .update(&created)
                .await
                .expect("Failed to update test session");
        }
        created
    }

    #[tokio::test]
    async fn test_create_rating_updates_mentor_aggregate() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor = create_test_user(&pool, "mentor").await;

        let first = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Borrow checker",
            SessionStatus::Completed,
        )
        .await;
        let second = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Async patterns",
            SessionStatus::Completed,
        )
        .await;

        repo.create_and_recompute(&Rating::new(first.id, requester, 4, String::new()), mentor)
            .await
            .expect("Failed to create rating");
        repo.create_and_recompute(
            &Rating::new(second.id, requester, 5, "Great".to_string()),
            mentor,
        )
        .await
        .expect("Failed to create rating");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let profile = user_repo
            .get_profile_by_user_id(mentor)
            .await
            .expect("Failed to get profile")
            .expect("Profile not found");

        assert_eq!(profile.rating_count, 2);
        assert!((profile.rating_avg - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_one_rating_per_session() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor = create_test_user(&pool, "mentor").await;

        let session = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Borrow checker",
            SessionStatus::Completed,
        )
        .await;

        repo.create_and_recompute(&Rating::new(session.id, requester, 5, String::new()), mentor)
            .await
            .expect("Failed to create rating");

        let duplicate = repo
            .create_and_recompute(&Rating::new(session.id, requester, 3, String::new()), mentor)
            .await;

        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_aggregate_counts_only_completed_sessions() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor = create_test_user(&pool, "mentor").await;

        let session = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Borrow checker",
            SessionStatus::Requested,
        )
        .await;

        repo.create_and_recompute(&Rating::new(session.id, requester, 5, String::new()), mentor)
            .await
            .expect("Failed to create rating");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let profile = user_repo
            .get_profile_by_user_id(mentor)
            .await
            .expect("Failed to get profile")
            .expect("Profile not found");

        assert_eq!(profile.rating_count, 0);
        assert_eq!(profile.rating_avg, 0.0);
    }

    #[tokio::test]
    async fn test_get_rating_by_session_id() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor = create_test_user(&pool, "mentor").await;

        let session = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Borrow checker",
            SessionStatus::Completed,
        )
        .await;

        let created = repo
            .create_and_recompute(
                &Rating::new(session.id, requester, 4, "Solid".to_string()),
                mentor,
            )
            .await
            .expect("Failed to create rating");

        let found = repo
            .get_by_session_id(session.id)
            .await
            .expect("Failed to get rating")
            .expect("Rating not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.score, 4);
        assert_eq!(found.comment, "Solid");
    }

    #[tokio::test]
    async fn test_get_rating_by_session_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo
            .get_by_session_id(999)
            .await
            .expect("Failed to get rating");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_ratings_newest_first() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor = create_test_user(&pool, "mentor").await;

        let first = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Borrow checker",
            SessionStatus::Completed,
        )
        .await;
        let second = create_session_with_status(
            &pool,
            requester,
            mentor,
            "Async patterns",
            SessionStatus::Completed,
        )
        .await;

        repo.create_and_recompute(&Rating::new(first.id, requester, 3, String::new()), mentor)
            .await
            .expect("Failed to create rating");
        repo.create_and_recompute(&Rating::new(second.id, requester, 5, String::new()), mentor)
            .await
            .expect("Failed to create rating");

        let ratings = repo.list(None).await.expect("Failed to list ratings");

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].score, 5);
        assert_eq!(ratings[1].score, 3);
    }

    #[tokio::test]
    async fn test_list_ratings_filtered_by_mentor() {
        let (pool, repo) = setup_test_repo().await;
        let requester = create_test_user(&pool, "learner").await;
        let mentor_a = create_test_user(&pool, "mentor_a").await;
        let mentor_b = create_test_user(&pool, "mentor_b").await;

        let session_a = create_session_with_status(
            &pool,
            requester,
            mentor_a,
            "Borrow checker",
            SessionStatus::Completed,
        )
        .await;
        let session_b = create_session_with_status(
            &pool,
            requester,
            mentor_b,
            "Async patterns",
            SessionStatus::Completed,
        )
        .await;

        repo.create_and_recompute(&Rating::new(session_a.id, requester, 4, String::new()), mentor_a)
            .await
            .expect("Failed to create rating");
        repo.create_and_recompute(&Rating::new(session_b.id, requester, 2, String::new()), mentor_b)
            .await
            .expect("Failed to create rating");

        let for_a = repo.list(Some(mentor_a)).await.expect("Failed to list ratings");
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].session_id, session_a.id);

        let for_b = repo.list(Some(mentor_b)).await.expect("Failed to list ratings");
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].session_id, session_b.id);
    }
}
